use eth::types::Address;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, clap::Parser)]
#[clap(name = "asset-collector", about = "Collects NFT assets from an EVM chain")]
pub struct Args {
    /// Output JSON file.
    #[clap(long, env, default_value = "story_assets.json")]
    pub output: PathBuf,

    /// Pretty-print the output file.
    #[clap(long, env)]
    pub pretty: bool,

    /// Debug logging and full error chains.
    #[clap(long, env)]
    pub debug: bool,

    /// The log filter.
    #[clap(long, env, default_value = "info")]
    pub log: String,

    /// The Ethereum RPC endpoint.
    #[clap(long, env, default_value = "https://aeneid.storyrpc.io/")]
    pub rpc_url: Url,

    /// Blockscout style REST API root.
    #[clap(long, env, default_value = "https://aeneid.storyscan.xyz/api/v2")]
    pub explorer_url: Url,

    /// Timeout of a single HTTP request in seconds (explorer, metadata and node).
    #[clap(long, env, default_value = "30")]
    pub http_timeout_secs: u64,

    /// Retries of a failed explorer or metadata request.
    #[clap(long, env, default_value = "5")]
    pub http_retries: u32,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Probe contracts directly through the node.
    Chain {
        /// Collect only this contract.
        #[clap(long, env)]
        contract: Option<Address>,

        #[clap(flatten)]
        probe: ProbeArgs,
    },
    /// Crawl the block explorer.
    Explorer {
        /// Collection of a single token lookup (requires --token-id).
        #[clap(long, env, requires = "token_id")]
        token_address: Option<Address>,

        /// Id of a single token lookup.
        #[clap(long, env, requires = "token_address")]
        token_id: Option<String>,

        #[clap(flatten)]
        crawl: CrawlArgs,
    },
    /// Explorer crawl followed by chain probing, skipping collections already covered.
    All {
        #[clap(flatten)]
        probe: ProbeArgs,

        #[clap(flatten)]
        crawl: CrawlArgs,
    },
}

#[derive(Debug, Clone, clap::Args)]
pub struct ProbeArgs {
    /// Additional contract to probe (repeatable).
    #[clap(long = "address", env = "ADDRESSES", value_delimiter = ',')]
    pub addresses: Vec<Address>,

    /// Highest token id to probe, instead of twice the declared supply.
    #[clap(long, env)]
    pub max_ids: Option<u64>,

    /// Token ids probed per batch.
    #[clap(long, env, default_value = "100")]
    pub batch_size: u64,

    /// Also probe contracts found through Transfer logs.
    #[clap(long, env)]
    pub scan_blocks: bool,

    /// First block of the log scan.
    #[clap(long, env, default_value = "0")]
    pub start_block: u64,

    /// Last block of the log scan (defaults to the latest block).
    #[clap(long, env)]
    pub end_block: Option<u64>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct CrawlArgs {
    /// Pages of /token-transfers to read.
    #[clap(long, env, default_value = "20")]
    pub max_transfer_pages: usize,

    /// Pages of /tokens to read.
    #[clap(long, env, default_value = "20")]
    pub max_token_pages: usize,

    /// Pages of instances to read per collection.
    #[clap(long, env, default_value = "10")]
    pub max_instance_pages: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn chain_defaults() {
        let args = Args::try_parse_from(["asset-collector", "chain"]).unwrap();
        assert_eq!(args.output, PathBuf::from("story_assets.json"));
        assert_eq!(args.rpc_url.as_str(), "https://aeneid.storyrpc.io/");
        assert_eq!(args.http_timeout_secs, 30);
        match args.command {
            Command::Chain { contract, probe } => {
                assert_eq!(contract, None);
                assert!(probe.addresses.is_empty());
                assert_eq!(probe.batch_size, 100);
                assert_eq!(probe.max_ids, None);
                assert!(!probe.scan_blocks);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn repeated_addresses() {
        let args = Args::try_parse_from([
            "asset-collector",
            "--pretty",
            "chain",
            "--address",
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
            "--address",
            "0x0000000000000000000000000000000000000001",
            "--max-ids",
            "50",
        ])
        .unwrap();
        assert!(args.pretty);
        let Command::Chain { probe, .. } = args.command else {
            panic!("expected chain command");
        };
        assert_eq!(probe.addresses.len(), 2);
        assert_eq!(probe.addresses[1], Address::from(1));
        assert_eq!(probe.max_ids, Some(50));
    }

    #[test]
    fn single_token_needs_both_parts() {
        assert!(Args::try_parse_from([
            "asset-collector",
            "explorer",
            "--token-id",
            "3",
        ])
        .is_err());
        let args = Args::try_parse_from([
            "asset-collector",
            "explorer",
            "--token-address",
            "0x0000000000000000000000000000000000000001",
            "--token-id",
            "3",
        ])
        .unwrap();
        let Command::Explorer {
            token_address,
            token_id,
            crawl,
        } = args.command
        else {
            panic!("expected explorer command");
        };
        assert_eq!(token_address, Some(Address::from(1)));
        assert_eq!(token_id.as_deref(), Some("3"));
        assert_eq!(crawl.max_transfer_pages, 20);
        assert_eq!(crawl.max_instance_pages, 10);
    }

    #[test]
    fn rejects_bad_address() {
        assert!(Args::try_parse_from(["asset-collector", "chain", "--contract", "0x12"]).is_err());
    }
}
