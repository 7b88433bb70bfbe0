use crate::Id;
use std::collections::{HashMap, HashSet};

/// Simple HashMap-based name generator that hands out unique names for each
/// prefix.
#[derive(Clone, Debug, Default)]
pub struct NameGenerator {
    name_hash: HashMap<Id, u32>,
    generated_names: HashSet<Id>,
}

impl NameGenerator {
    /// Create a NameGenerator where `names` are already defined so that this generator
    /// will never generate those names.
    pub fn with_prev_defined_names<I>(names: I) -> Self
    where
        I: IntoIterator<Item = Id>,
    {
        NameGenerator {
            generated_names: names.into_iter().collect(),
            name_hash: HashMap::default(),
        }
    }

    /// Returns a new name that starts with `prefix`.
    /// The first request for a prefix returns the prefix itself and later
    /// requests append `_1`, `_2`, ...
    /// ```
    /// # use cash_utils::NameGenerator;
    /// let mut namegen = NameGenerator::default();
    /// assert_eq!(namegen.gen_name("cnt"), "cnt");
    /// assert_eq!(namegen.gen_name("cnt"), "cnt_1");
    /// ```
    pub fn gen_name<S>(&mut self, prefix: S) -> Id
    where
        S: Into<Id>,
    {
        let prefix: Id = prefix.into();
        loop {
            let count = self.name_hash.entry(prefix).or_insert(0);
            let name = if *count == 0 {
                prefix
            } else {
                Id::from(format!("{prefix}_{count}"))
            };
            *count += 1;

            if self.generated_names.insert(name) {
                return name;
            }
        }
    }
}
