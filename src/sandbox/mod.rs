//! Component Sandbox
//!
//! Every custom component runs in its own QuickJS engine (`rquickjs`):
//! - the context has the ECMAScript built-ins only, with no module loader
//!   and no host objects such as `process`, `require`, `fetch` or timers
//! - `console.*` is forwarded to `tracing` under `blocks_native::console`
//! - memory, native stack and wall-clock time are capped by
//!   `ExecutionLimits`; exceeding any of them ends the evaluation with a
//!   `SandboxError` instead of unwinding into the host
//!
//! The time limit is enforced through the engine's interrupt handler. An
//! interrupted evaluation cannot be caught by `try`/`catch` in user code.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rquickjs::convert::Coerced;
use rquickjs::function::Rest;
use rquickjs::{CatchResultExt, CaughtError, Context, Ctx, Function, Object, Runtime};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::ExecutionLimits;

/// The React runtime and renderer evaluated into every engine.
pub const HOST_SCRIPT: &str = include_str!("host.js");

const CONSOLE_TARGET: &str = "blocks_native::console";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SandboxError {
    /// An `Error` thrown by component code or the engine, as `Name: message`.
    #[error("{0}")]
    Exception(String),

    /// A thrown value that is not an `Error` object.
    #[error("Uncaught {0}")]
    Thrown(String),

    #[error("Execution aborted: exceeded the time limit of {0} ms")]
    TimeLimit(u64),

    #[error("{name} is not a component (expected a function, got {found})")]
    NotAComponent { name: String, found: String },

    #[error("Invalid render output: {0}")]
    Output(String),

    #[error("Script engine error: {0}")]
    Engine(String),
}

impl From<rquickjs::Error> for SandboxError {
    fn from(err: rquickjs::Error) -> Self {
        SandboxError::Engine(err.to_string())
    }
}

/// Converts an engine result, pulling the pending exception out of `ctx`.
pub fn caught<'js, T>(ctx: &Ctx<'js>, result: rquickjs::Result<T>) -> Result<T, SandboxError> {
    result.catch(ctx).map_err(|err| match err {
        CaughtError::Exception(exception) => {
            let name = exception
                .get::<_, Option<String>>("name")
                .ok()
                .flatten()
                .unwrap_or_else(|| "Error".to_string());
            match exception.message() {
                Some(message) if !message.is_empty() => {
                    SandboxError::Exception(format!("{}: {}", name, message))
                }
                _ => SandboxError::Exception(name),
            }
        }
        CaughtError::Value(value) => SandboxError::Thrown(
            value
                .get::<Coerced<String>>()
                .map(|text| text.0)
                .unwrap_or_else(|_| "exception".to_string()),
        ),
        CaughtError::Error(err) => SandboxError::from(err),
    })
}

/// Wall-clock budget shared with the interrupt handler.
#[derive(Debug)]
struct Deadline {
    origin: Instant,
    deadline_ms: AtomicU64,
    expired: AtomicBool,
}

impl Deadline {
    fn new() -> Self {
        Deadline {
            origin: Instant::now(),
            deadline_ms: AtomicU64::new(u64::MAX),
            expired: AtomicBool::new(false),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn arm(&self, limit_ms: u64) {
        self.expired.store(false, Ordering::SeqCst);
        self.deadline_ms
            .store(self.elapsed_ms().saturating_add(limit_ms), Ordering::SeqCst);
    }

    /// Polled by the engine; `true` interrupts the running script.
    fn poll(&self) -> bool {
        if self.elapsed_ms() >= self.deadline_ms.load(Ordering::SeqCst) {
            self.expired.store(true, Ordering::SeqCst);
        }
        self.expired.load(Ordering::SeqCst)
    }

    fn expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }
}

/// One isolated engine. Values saved with `rquickjs::Persistent` must be
/// dropped before their `Sandbox`.
pub struct Sandbox {
    context: Context,
    // Declared after `context` so the context is released first.
    _runtime: Runtime,
    deadline: Arc<Deadline>,
    limits: ExecutionLimits,
}

impl std::fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sandbox")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl Sandbox {
    pub fn new(limits: ExecutionLimits) -> Result<Self, SandboxError> {
        let runtime = Runtime::new()?;
        runtime.set_memory_limit(limits.memory_limit);
        runtime.set_max_stack_size(limits.max_stack_size);

        let deadline = Arc::new(Deadline::new());
        let handler = Arc::clone(&deadline);
        runtime.set_interrupt_handler(Some(Box::new(move || handler.poll())));

        let context = Context::full(&runtime)?;
        context.with(install_console)?;
        debug!(
            memory_limit = limits.memory_limit,
            time_limit_ms = limits.time_limit_ms,
            "sandbox created"
        );

        Ok(Sandbox {
            context,
            _runtime: runtime,
            deadline,
            limits,
        })
    }

    pub fn limits(&self) -> ExecutionLimits {
        self.limits
    }

    /// Runs `f` inside the engine with a fresh time budget. An evaluation
    /// cut short by the interrupt handler reports `SandboxError::TimeLimit`
    /// whatever the script did with the interruption.
    pub fn with<F, R>(&self, f: F) -> Result<R, SandboxError>
    where
        F: for<'js> FnOnce(Ctx<'js>) -> Result<R, SandboxError>,
    {
        self.deadline.arm(self.limits.time_limit_ms);
        let result = self.context.with(f);
        match result {
            Err(_) if self.deadline.expired() => {
                Err(SandboxError::TimeLimit(self.limits.time_limit_ms))
            }
            other => other,
        }
    }
}

fn console_line(args: Rest<Coerced<String>>) -> String {
    args.0
        .into_iter()
        .map(|arg| arg.0)
        .collect::<Vec<_>>()
        .join(" ")
}

fn install_console(ctx: Ctx<'_>) -> Result<(), SandboxError> {
    let console = Object::new(ctx.clone())?;
    console.set(
        "log",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            info!(target: CONSOLE_TARGET, "{}", console_line(args));
        })?,
    )?;
    console.set(
        "info",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            info!(target: CONSOLE_TARGET, "{}", console_line(args));
        })?,
    )?;
    console.set(
        "debug",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            debug!(target: CONSOLE_TARGET, "{}", console_line(args));
        })?,
    )?;
    console.set(
        "warn",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            warn!(target: CONSOLE_TARGET, "{}", console_line(args));
        })?,
    )?;
    console.set(
        "error",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            error!(target: CONSOLE_TARGET, "{}", console_line(args));
        })?,
    )?;
    ctx.globals().set("console", console)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_string(sandbox: &Sandbox, source: &str) -> Result<String, SandboxError> {
        let source = source.to_string();
        sandbox.with(|ctx| caught(&ctx, ctx.eval::<String, _>(source)))
    }

    #[test]
    fn test_host_script_evaluates_to_host_object() {
        let sandbox = Sandbox::new(ExecutionLimits::default()).unwrap();
        let keys = sandbox
            .with(|ctx| {
                let host: Object = caught(&ctx, ctx.eval(HOST_SCRIPT))?;
                Ok(host.keys::<String>().collect::<rquickjs::Result<Vec<_>>>()?)
            })
            .unwrap();
        assert_eq!(keys, vec!["runtime", "library", "render"]);
    }

    #[test]
    fn test_exceptions_are_named() {
        let sandbox = Sandbox::new(ExecutionLimits::default()).unwrap();
        let err = eval_string(&sandbox, "null.x").unwrap_err();
        assert!(matches!(err, SandboxError::Exception(ref m) if m.starts_with("TypeError")));

        let err = eval_string(&sandbox, "throw 'plain'").unwrap_err();
        assert_eq!(err, SandboxError::Thrown("plain".into()));
    }

    #[test]
    fn test_time_limit_interrupts_and_rearms() {
        let limits = ExecutionLimits {
            time_limit_ms: 50,
            ..ExecutionLimits::default()
        };
        let sandbox = Sandbox::new(limits).unwrap();
        let err = eval_string(&sandbox, "for (;;) {}").unwrap_err();
        assert_eq!(err, SandboxError::TimeLimit(50));
        assert_eq!(eval_string(&sandbox, "String(1 + 1)").unwrap(), "2");
    }

    #[test]
    fn test_console_is_the_only_added_global() {
        let sandbox = Sandbox::new(ExecutionLimits::default()).unwrap();
        let kinds = eval_string(
            &sandbox,
            "[typeof console.log, typeof process, typeof require, typeof setTimeout].join(',')",
        )
        .unwrap();
        assert_eq!(kinds, "function,undefined,undefined,undefined");
    }
}
