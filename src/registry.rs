use crate::builtins::BUILTINS;
use crate::error::Error;
use crate::value::Value;
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A native function callable from expressions
pub type Function = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

lazy_static! {
    static ref DEFAULT_REGISTRY: RwLock<Registry> = RwLock::new(Registry::with_builtins());
}

/// Mapping from function names to native functions.
///
/// Functions are resolved once, when an expression is compiled. A registry
/// is frozen by the first compilation that uses it, after which
/// [`Registry::register`] is refused.
pub struct Registry {
    functions: HashMap<String, Function>,
    frozen: AtomicBool,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl Debug for Registry {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        fmt.debug_struct("Registry")
            .field("functions", &names)
            .field("frozen", &self.is_frozen())
            .finish()
    }
}

impl Registry {
    /// Create a registry without any function
    #[must_use]
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
            frozen: AtomicBool::new(false),
        }
    }

    /// Create a registry holding the default built-ins
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut functions = HashMap::<String, Function>::with_capacity(BUILTINS.len());
        for &(name, builtin) in BUILTINS {
            functions.insert(name.into(), Arc::new(builtin));
        }
        Self {
            functions,
            frozen: AtomicBool::new(false),
        }
    }

    /// Add or replace the function called `name`.
    ///
    /// # Errors
    ///
    /// Fails with `Error::Config` once an expression was compiled against
    /// this registry.
    pub fn register<F>(&mut self, name: &str, function: F) -> Result<(), Error>
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        if self.is_frozen() {
            return Err(Error::Config(format!(
                "cannot register `{}`: registry is already in use",
                name
            )));
        }
        log::debug!("registering function `{}`", name);
        self.functions.insert(name.into(), Arc::new(function));
        Ok(())
    }

    /// Look up a function by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Check if a function called `name` exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Refuse any further registration
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
    }

    /// Check if registration is closed
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }
}

/// Add or replace a function in the process-wide registry used by
/// [`Expr::parse`](crate::Expr::parse) and [`Rule::compile`](crate::Rule::compile).
///
/// # Errors
///
/// Fails with `Error::Config` once any expression was compiled with the
/// process-wide registry.
pub fn register_builtin<F>(name: &str, function: F) -> Result<(), Error>
where
    F: Fn(&[Value]) -> Value + Send + Sync + 'static,
{
    DEFAULT_REGISTRY.write().register(name, function)
}

/// Run `f` with shared access to the process-wide registry
pub(crate) fn with_default<T>(f: impl FnOnce(&Registry) -> T) -> T {
    f(&DEFAULT_REGISTRY.read())
}
