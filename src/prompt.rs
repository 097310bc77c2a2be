use std::path::Path;
use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use tracing::debug;

use crate::dict::{CategoryDictionary, loader};
use crate::sampler::{Combination, Sampler, SamplerOptions};
use crate::template::alias::alias_numbered_fields;
use crate::template::functions::Functions;
use crate::template::{Template, TemplateError, TemplateSet};

/// Renders templates against unique combinations from one shared sampler.
///
/// All templates draw from the same space, so a combination used for one
/// template is not used again for another until [`Sampler::reset`].
pub struct PromptPermutator {
    templates: TemplateSet,
    sampler: Sampler,
    functions: Mutex<Functions>,
}

impl PromptPermutator {
    pub fn new(
        templates: TemplateSet,
        mut dict: CategoryDictionary,
        options: SamplerOptions,
    ) -> Result<Self> {
        alias_numbered_fields(&templates, &mut dict);
        let sampler = Sampler::with_options(&dict, options)?;
        // Derived from the sampler seed so one seed reproduces the whole run.
        let functions = Functions::seeded(sampler.seed().rotate_left(32) ^ 0x9e37_79b9_7f4a_7c15);
        debug!(
            templates = templates.len(),
            capacity = sampler.capacity(),
            "prompt permutator ready"
        );
        Ok(Self {
            templates,
            sampler,
            functions: Mutex::new(functions),
        })
    }

    pub fn from_paths(
        template_paths: &[impl AsRef<Path>],
        dict_paths: &[impl AsRef<Path>],
        options: SamplerOptions,
    ) -> Result<Self> {
        let dict = loader::load(dict_paths)?;
        let templates = TemplateSet::load(template_paths)?;
        Self::new(templates, dict, options)
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Up to `n` prompts from one template, each from a fresh combination.
    pub fn gen_n(&self, n: usize, template_name: &str) -> Result<Vec<String>, TemplateError> {
        let template = self
            .templates
            .get(template_name)
            .ok_or_else(|| TemplateError::UnknownTemplate(template_name.to_string()))?;
        let batch = self.sampler.draw_batch(n);
        self.render_all(template, &batch)
    }

    /// `gen_n` for every template, in name order.
    pub fn foreach_template_gen(&self, n: usize) -> Result<Vec<String>, TemplateError> {
        let mut prompts = Vec::new();
        for template in self.templates.iter() {
            let batch = self.sampler.draw_batch(n);
            prompts.extend(self.render_all(template, &batch)?);
        }
        Ok(prompts)
    }

    fn render_all(
        &self,
        template: &Template,
        batch: &[Combination],
    ) -> Result<Vec<String>, TemplateError> {
        let mut functions = self.functions.lock().unwrap_or_else(PoisonError::into_inner);
        batch
            .iter()
            .map(|combination| template.render(combination, &mut functions))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn permutator(sources: &[(&str, &str)], seed: u64) -> PromptPermutator {
        let mut templates = TemplateSet::new();
        for (name, source) in sources {
            templates.insert(Template::parse(*name, source).unwrap());
        }
        let dict = crate::dict::parse(
            r#"{"Animal": ["cat", "dog", "owl"], "Color": ["red", "blue"]}"#,
        )
        .unwrap();
        PromptPermutator::new(templates, dict, SamplerOptions::seeded(seed)).unwrap()
    }

    #[test]
    fn test_gen_n_renders_unique_prompts() {
        let p = permutator(&[("pet.tpl", "a {{.Color}} {{.Animal}}")], 1);
        let prompts = p.gen_n(100, "pet.tpl").unwrap();
        assert_eq!(prompts.len(), 6);
        assert_eq!(prompts.iter().collect::<HashSet<_>>().len(), 6);
        assert!(p.gen_n(1, "pet.tpl").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_template_is_an_error() {
        let p = permutator(&[("pet.tpl", "{{.Animal}}")], 2);
        assert_eq!(
            p.gen_n(1, "nope.tpl").unwrap_err(),
            TemplateError::UnknownTemplate("nope.tpl".into())
        );
    }

    #[test]
    fn test_templates_share_one_sampler() {
        let p = permutator(&[("a.tpl", "{{.Animal}}"), ("b.tpl", "{{.Animal}}")], 3);
        let prompts = p.foreach_template_gen(4).unwrap();
        // 6 combinations in total: 4 for a.tpl, the remaining 2 for b.tpl.
        assert_eq!(prompts.len(), 6);
        assert_eq!(p.sampler().remaining(), 0);
    }

    #[test]
    fn test_numbered_fields_multiply_the_space() {
        let p = permutator(&[("pair.tpl", "{{.Animal1}} meets {{.Animal2}}")], 4);
        // Animal, Animal1, Animal2 (3 each) and Color (2).
        assert_eq!(p.sampler().capacity(), 54);
        let prompts = p.gen_n(3, "pair.tpl").unwrap();
        assert!(prompts.iter().all(|s| s.contains(" meets ")));
    }

    #[test]
    fn test_same_seed_same_prompts() {
        let source = "{{.Animal}} {{randInt 0 1000}}";
        let a = permutator(&[("t.tpl", source)], 5).gen_n(6, "t.tpl").unwrap();
        let b = permutator(&[("t.tpl", source)], 5).gen_n(6, "t.tpl").unwrap();
        assert_eq!(a, b);
    }
}
