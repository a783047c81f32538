//! 🧵 Workers: the ones who actually do the work while the Supervisor takes all the
//! credit in the sprint retro.
//!
//! ⚠️ "If you're reading this, the code review went poorly."

use tokio::task::JoinHandle;

mod harvest_worker;
pub(in crate::supervisors) use harvest_worker::HarvestWorker;

/// 🏗️ A background worker, that does work. duh.
///
/// Workers deal with their own failures. The handle resolves once the worker is
/// completely done, leftovers flushed and all, so joining it is the whole
/// "are you finished?" conversation.
pub(crate) trait Worker {
    fn start(self) -> JoinHandle<()>;
}
