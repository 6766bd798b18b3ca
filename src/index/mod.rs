// ─── Index Processors ───
// A processor inspects one index (Mojang's per-version documents or the
// publisher distribution) and emits the assets that are missing or invalid
// on disk, then finalizes after the queue has run.

mod distribution;
mod mojang;

use std::collections::HashMap;

use async_trait::async_trait;

pub use distribution::DistributionIndexProcessor;
pub use mojang::MojangIndexProcessor;

use crate::asset::Asset;
use crate::error::CoreResult;

/// Invoked after each coarse validation stage completes.
pub type StageFn<'a> = dyn Fn() + Send + Sync + 'a;

#[async_trait]
pub trait IndexProcessor {
    /// Acquire any remote documents needed for validation. Unrecoverable
    /// loss is fatal here, not later.
    async fn init(&mut self) -> CoreResult<()>;

    /// Coarse progress ticks this processor contributes.
    fn total_stages(&self) -> u32;

    /// Compute the invalid-asset set, invoking `on_stage` after each stage.
    async fn validate(&mut self, on_stage: &StageFn<'_>) -> CoreResult<HashMap<String, Vec<Asset>>>;

    /// Finalize after downloads succeed (e.g. persist a mod-loader overlay).
    async fn post_download(&mut self) -> CoreResult<()>;
}

/// Closed dispatcher over the concrete processors, no Box<dyn>.
pub enum Processor {
    Mojang(MojangIndexProcessor),
    Distribution(DistributionIndexProcessor),
}

impl Processor {
    pub async fn init(&mut self) -> CoreResult<()> {
        match self {
            Processor::Mojang(p) => p.init().await,
            Processor::Distribution(p) => p.init().await,
        }
    }

    pub fn total_stages(&self) -> u32 {
        match self {
            Processor::Mojang(p) => p.total_stages(),
            Processor::Distribution(p) => p.total_stages(),
        }
    }

    pub async fn validate(
        &mut self,
        on_stage: &StageFn<'_>,
    ) -> CoreResult<HashMap<String, Vec<Asset>>> {
        match self {
            Processor::Mojang(p) => p.validate(on_stage).await,
            Processor::Distribution(p) => p.validate(on_stage).await,
        }
    }

    pub async fn post_download(&mut self) -> CoreResult<()> {
        match self {
            Processor::Mojang(p) => p.post_download().await,
            Processor::Distribution(p) => p.post_download().await,
        }
    }
}
