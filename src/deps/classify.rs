use std::path::Path;

use crate::golang::CGO_IMPORT;
use crate::index::ReverseIndex;
use crate::runtime::Runtime;
use crate::stdlib::StdlibSet;

/// Outcome of classifying one import edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The import lives under the target itself.
    SelfReference,
    Stdlib,
    /// A copy exists in a `vendor/` directory of the target or an ancestor.
    Vendored,
    /// The target is not registered, so the import cannot be classified.
    UnregisteredOwner,
    /// The `"C"` pseudo-import, whatever the index holds.
    Cgo,
    Accept,
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        self == Verdict::Accept
    }
}

/// Exclusion rules for the imports found while walking one target.
pub struct EdgeClassifier<'a, R: Runtime> {
    runtime: &'a R,
    base: &'a Path,
    target: &'a str,
    stdlib: &'a StdlibSet,
    owner_registered: bool,
}

impl<'a, R: Runtime> EdgeClassifier<'a, R> {
    pub fn new(
        runtime: &'a R,
        base: &'a Path,
        target: &'a str,
        stdlib: &'a StdlibSet,
        index: &ReverseIndex,
    ) -> Self {
        Self {
            runtime,
            base,
            target,
            stdlib,
            owner_registered: index.prefix_match(target).is_some(),
        }
    }

    pub fn target(&self) -> &str {
        self.target
    }

    pub fn owner_registered(&self) -> bool {
        self.owner_registered
    }

    /// Apply the rules in order; the first that matches decides.
    pub fn classify(&self, import_path: &str) -> Verdict {
        if import_path.starts_with(self.target) {
            Verdict::SelfReference
        } else if self.stdlib.contains(import_path) {
            Verdict::Stdlib
        } else if import_path == CGO_IMPORT {
            Verdict::Cgo
        } else if self.is_vendored(import_path) {
            Verdict::Vendored
        } else if !self.owner_registered {
            Verdict::UnregisteredOwner
        } else {
            Verdict::Accept
        }
    }

    /// Look for `<base>/<ancestor>/vendor/<import_path>` for the target and
    /// each of its ancestors.
    fn is_vendored(&self, import_path: &str) -> bool {
        let mut ancestor = self.target;
        loop {
            let vendored = self.base.join(ancestor).join("vendor").join(import_path);
            if self.runtime.exists(&vendored) {
                return true;
            }
            match ancestor.rfind('/') {
                Some(i) => ancestor = &ancestor[..i],
                None => return false,
            }
        }
    }
}
