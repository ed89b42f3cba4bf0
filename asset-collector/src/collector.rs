use crate::models::{AssetRecord, Container, SourceKind};
use async_trait::async_trait;
use eth::types::Address;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;

/// One way of enumerating assets: where the containers come from, how their
/// members are found and how a member becomes a record.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Whatever discovery yields per member (an id, or a full listing item).
    type Member: Send;

    fn kind(&self) -> SourceKind;

    async fn containers(&self) -> Vec<Container>;

    async fn discover(&self, container: &Container) -> Vec<Self::Member>;

    /// `None` drops the member from the result.
    async fn resolve(&self, container: &Container, member: Self::Member) -> Option<AssetRecord>;
}

/// Runs sources one after another, remembering which containers have been
/// covered so a container reported by several sources is processed once.
pub struct Collector {
    resolve_workers: usize,
    processed: HashSet<Address>,
    records: Vec<AssetRecord>,
}

impl Collector {
    pub fn new(resolve_workers: usize) -> Self {
        Self {
            resolve_workers: resolve_workers.max(1),
            processed: HashSet::new(),
            records: Vec::new(),
        }
    }

    /// Collect every container `source` knows about. Returns the number of
    /// records added.
    pub async fn collect<S: AssetSource>(&mut self, source: &S) -> usize {
        let containers = source.containers().await;
        tracing::info!(
            "{:?}: {} containers to process",
            source.kind(),
            containers.len()
        );
        self.collect_from(source, containers).await
    }

    /// Collect the given containers through `source`.
    pub async fn collect_from<S: AssetSource>(
        &mut self,
        source: &S,
        containers: Vec<Container>,
    ) -> usize {
        let before = self.records.len();
        for container in containers {
            if !self.processed.insert(container.address) {
                tracing::debug!("skipping already processed {}", container.address);
                continue;
            }
            let added = self.collect_container(source, &container).await;
            tracing::info!(
                "{:?}: {added} assets in {} ({})",
                source.kind(),
                container.name.as_deref().unwrap_or("unnamed"),
                container.address
            );
        }
        self.records.len() - before
    }

    async fn collect_container<S: AssetSource>(&mut self, source: &S, container: &Container) -> usize {
        let members = source.discover(container).await;
        tracing::debug!("resolving {} members of {}", members.len(), container.address);
        let resolved: Vec<AssetRecord> = stream::iter(members)
            .map(|member| source.resolve(container, member))
            .buffer_unordered(self.resolve_workers)
            .filter_map(|record| async move { record })
            .collect()
            .await;
        let added = resolved.len();
        self.records.extend(resolved);
        added
    }

    /// Whether a previous source already covered `address`.
    pub fn is_processed(&self, address: &Address) -> bool {
        self.processed.contains(address)
    }

    pub fn records(&self) -> &[AssetRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<AssetRecord> {
        self.records
    }
}
