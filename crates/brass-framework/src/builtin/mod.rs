//! Plugins shipped with Brass.
//!
//! With the `builtin` feature (on by default) they are registered in the
//! link-time catalog under the [`BUILTIN_PREFIX`](crate::handler::BUILTIN_PREFIX):
//!
//! | Short name   | Type                                     | Hook          |
//! |--------------|------------------------------------------|---------------|
//! | `Command`    | [`CommandRouter`](crate::command::CommandRouter) | `onPrivmsg`   |
//! | `Prioritize` | [`Prioritize`](crate::prioritize::Prioritize)    | `preDispatch` |
//! | `Cron`       | [`Cron`]                                 | `onTick`      |

pub mod cron;

pub use cron::{Cron, JobId};

#[cfg(feature = "builtin")]
mod registrations {
    use linkme::distributed_slice;
    use serde_json::Value;

    use super::Cron;
    use crate::command::CommandRouter;
    use crate::plugin::{PLUGIN_CLASSES, Plugin, PluginClass};
    use crate::prioritize::Prioritize;

    fn command(_: &[Value]) -> Result<Box<dyn Plugin>, String> {
        Ok(Box::new(CommandRouter::new()))
    }

    fn prioritize(_: &[Value]) -> Result<Box<dyn Plugin>, String> {
        Ok(Box::new(Prioritize::new()))
    }

    fn cron(_: &[Value]) -> Result<Box<dyn Plugin>, String> {
        Ok(Box::new(Cron::new()))
    }

    #[distributed_slice(PLUGIN_CLASSES)]
    static COMMAND: PluginClass = PluginClass::concrete("brass::plugin::Command", command);

    #[distributed_slice(PLUGIN_CLASSES)]
    static PRIORITIZE: PluginClass = PluginClass::concrete("brass::plugin::Prioritize", prioritize);

    #[distributed_slice(PLUGIN_CLASSES)]
    static CRON: PluginClass = PluginClass::concrete("brass::plugin::Cron", cron);
}
