use crate::sampler::guard::Sampler;
use crate::sampler::space::Combination;

/// One combination at a time from a shared [`Sampler`].
///
/// Other cursors, batch draws and resets on the same sampler all consume the
/// same state, so a cursor only sees what nobody else has taken.
pub struct Cursor<'a> {
    sampler: &'a Sampler,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(sampler: &'a Sampler) -> Self {
        Self { sampler }
    }

    /// Whether the space still had unseen combinations at the time of the
    /// call. Another thread may take the last one before `next` runs.
    pub fn has_next(&self) -> bool {
        self.sampler.has_next()
    }
}

impl Iterator for Cursor<'_> {
    type Item = Combination;

    fn next(&mut self) -> Option<Combination> {
        self.sampler.take_one()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.sampler.remaining()).unwrap_or(usize::MAX);
        (0, Some(remaining))
    }
}

/// Fixed-size batches until the sampler runs dry.
pub struct Batches<'a> {
    sampler: &'a Sampler,
    size: usize,
}

impl<'a> Batches<'a> {
    pub(crate) fn new(sampler: &'a Sampler, size: usize) -> Self {
        Self { sampler, size }
    }
}

impl Iterator for Batches<'_> {
    type Item = Vec<Combination>;

    fn next(&mut self) -> Option<Vec<Combination>> {
        let batch = self.sampler.draw_batch(self.size);
        if batch.is_empty() { None } else { Some(batch) }
    }
}
