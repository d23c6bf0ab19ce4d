//! # modbot-examples
//!
//! Small feature modules showing the module API: commands, delayed replies and a
//! persistent inline keyboard.

pub mod echo;
pub mod timer;
pub mod vote;

use std::sync::Arc;

use modbot::{BotModule, ModuleRegistry};

pub use echo::EchoModule;
pub use timer::TimerModule;
pub use vote::VoteModule;

/// Registers `echo`, `timer` and `vote`.
pub fn register_all(registry: &mut ModuleRegistry) {
    registry
        .register("echo", |_| Ok(Arc::new(EchoModule) as Arc<dyn BotModule>))
        .register("timer", |_| {
            Ok(Arc::new(TimerModule::default()) as Arc<dyn BotModule>)
        })
        .register("vote", |env| {
            Ok(Arc::new(VoteModule::new(env.helpers())) as Arc<dyn BotModule>)
        });
}
