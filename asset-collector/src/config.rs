use crate::{
    cli::{Args, CrawlArgs, ProbeArgs},
    sources::{InstancePaging, ProbeConfig},
};
use shared::http::TransportConfig;
use std::time::Duration;

/// Workers resolving the members of one container concurrently.
pub const RESOLVE_WORKERS: usize = 5;
/// Workers probing the ids of one batch concurrently.
pub const PROBE_WORKERS: usize = 10;
/// Items requested per explorer page.
pub const PAGE_SIZE: u32 = 100;

/// Optional `Transfer` log scan over `[start, end]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockScan {
    pub start: u64,
    /// `None` scans up to the latest block.
    pub end: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectorConfig {
    pub resolve_workers: usize,
    pub probe: ProbeConfig,
    pub scan: Option<BlockScan>,
    pub paging: InstancePaging,
    pub max_transfer_pages: usize,
    pub transport: TransportConfig,
    /// Request timeout of the node client.
    pub node_timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        let transport = TransportConfig::default();
        Self {
            resolve_workers: RESOLVE_WORKERS,
            probe: ProbeConfig::default(),
            scan: None,
            paging: InstancePaging::default(),
            max_transfer_pages: 20,
            node_timeout: transport.timeout,
            transport,
        }
    }
}

impl CollectorConfig {
    /// Settings shared by every command.
    pub fn from_args(args: &Args) -> Self {
        let timeout = Duration::from_secs(args.http_timeout_secs);
        Self {
            transport: TransportConfig {
                timeout,
                max_retries: args.http_retries,
                ..Default::default()
            },
            node_timeout: timeout,
            ..Default::default()
        }
    }

    pub fn with_probe(mut self, probe: &ProbeArgs) -> Self {
        self.probe = ProbeConfig {
            max_ids: probe.max_ids,
            batch_size: probe.batch_size,
            workers: PROBE_WORKERS,
        };
        self.scan = probe.scan_blocks.then(|| BlockScan {
            start: probe.start_block,
            end: probe.end_block,
        });
        self
    }

    pub fn with_crawl(mut self, crawl: &CrawlArgs) -> Self {
        self.paging = InstancePaging {
            page_size: PAGE_SIZE,
            max_token_pages: crawl.max_token_pages,
            max_instance_pages: crawl.max_instance_pages,
        };
        self.max_transfer_pages = crawl.max_transfer_pages;
        self
    }
}
