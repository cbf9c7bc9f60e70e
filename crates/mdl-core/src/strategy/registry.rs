//! First-match strategy resolution.

use std::sync::Arc;

use crate::deps::Toolchain;
use crate::model::{Job, Provider};

use super::ytdlp::{GenericStrategy, ProviderStrategy};
use super::DownloadStrategy;

/// Ordered candidate list plus a fallback. Registration order decides ties.
pub struct StrategyRegistry {
    strategies: Vec<Arc<dyn DownloadStrategy>>,
    fallback: Arc<dyn DownloadStrategy>,
}

impl StrategyRegistry {
    pub fn new(fallback: Arc<dyn DownloadStrategy>) -> Self {
        Self {
            strategies: Vec::new(),
            fallback,
        }
    }

    /// Provider strategies for the known sites, generic fallback.
    pub fn with_defaults(toolchain: Arc<Toolchain>) -> Self {
        let mut registry = Self::new(Arc::new(GenericStrategy::new(Arc::clone(&toolchain))));
        registry.register(Arc::new(
            ProviderStrategy::new("youtube", vec![Provider::YouTube], Arc::clone(&toolchain))
                .with_args(["--no-playlist"]),
        ));
        registry.register(Arc::new(
            ProviderStrategy::new("soundcloud", vec![Provider::SoundCloud], Arc::clone(&toolchain))
                .audio_first(),
        ));
        registry.register(Arc::new(
            ProviderStrategy::new(
                "social",
                vec![Provider::TikTok, Provider::Twitter, Provider::Instagram],
                Arc::clone(&toolchain),
            )
            .with_args(["--no-playlist"]),
        ));
        registry
    }

    pub fn register(&mut self, strategy: Arc<dyn DownloadStrategy>) -> &mut Self {
        self.strategies.push(strategy);
        self
    }

    /// First registered strategy whose `can_handle` accepts `job`, else the fallback.
    pub fn resolve(&self, job: &Job) -> Arc<dyn DownloadStrategy> {
        self.strategies
            .iter()
            .find(|s| s.can_handle(job))
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    /// Names in resolution order, fallback last.
    pub fn names(&self) -> Vec<String> {
        self.strategies
            .iter()
            .chain(std::iter::once(&self.fallback))
            .map(|s| s.name().to_string())
            .collect()
    }
}
