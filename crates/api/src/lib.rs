mod job_schedulers;
mod reminder;
mod settings;
mod shared;

use job_schedulers::{start_channel_updates_job, start_dispatch_job};
use nudge_infra::NudgeContext;

pub struct Application {
    context: NudgeContext,
}

impl Application {
    pub async fn new(context: NudgeContext) -> anyhow::Result<Self> {
        Ok(Self { context })
    }

    pub async fn start(self) -> anyhow::Result<()> {
        start_dispatch_job(self.context.clone());
        start_channel_updates_job(self.context);
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}
