use crate::{
    cli::{Args, Command},
    collector::Collector,
    config::{CollectorConfig, PAGE_SIZE},
    discovery::scan_for_contracts,
    models::{AssetRecord, TokenId},
    output::{write_json, CollectionDocument, ContractDocument},
    report::Summary,
    sources::{
        chain::known_collections, transfers::fetch_single_asset, ChainSource, InstanceSource,
        TransferSource,
    },
};
use anyhow::{Context, Result};
use eth::{
    rpc::{ethers::Client as EthersClient, EthNodeReading},
    types::Address,
};
use explorer::ExplorerClient;
use metadata_retriever::{Homebrew, MetadataFetching};
use shared::http::{HttpTransport, RetryingClient};
use std::{collections::HashSet, path::PathBuf, sync::Arc};

/// Remote collaborators of a run, all sharing one transport configuration.
struct Clients {
    node: Arc<dyn EthNodeReading>,
    explorer: Arc<ExplorerClient>,
    fetcher: Arc<dyn MetadataFetching>,
}

impl Clients {
    fn new(args: &Args, config: &CollectorConfig) -> Result<Self> {
        let transport: Arc<dyn HttpTransport> =
            Arc::new(RetryingClient::new(config.transport.clone()).context("init RetryingClient")?);
        Ok(Self {
            node: Arc::new(
                EthersClient::new(args.rpc_url.as_str(), config.node_timeout)
                    .context("init EthersClient")?,
            ),
            explorer: Arc::new(
                ExplorerClient::new(args.explorer_url.as_str(), transport.clone())
                    .context("init ExplorerClient")?,
            ),
            fetcher: Arc::new(Homebrew::new(transport)),
        })
    }
}

pub async fn run(args: Args) -> Result<()> {
    let config = CollectorConfig::from_args(&args);
    let output = Output {
        path: args.output.clone(),
        pretty: args.pretty,
    };
    match &args.command {
        Command::Chain {
            contract: Some(address),
            probe,
        } => {
            let config = config.with_probe(probe);
            let clients = Clients::new(&args, &config)?;
            connect(clients.node.as_ref(), &args).await?;
            collect_contract(&clients, &config, *address, &output).await
        }
        Command::Chain {
            contract: None,
            probe,
        } => {
            let config = config.with_probe(probe);
            let clients = Clients::new(&args, &config)?;
            let chain_id = connect(clients.node.as_ref(), &args).await?;
            let mut collector = Collector::new(config.resolve_workers);
            collect_chain(
                clients.node.clone(),
                clients.fetcher.clone(),
                &config,
                &probe.addresses,
                &mut collector,
            )
            .await?;
            output.collection(collector.records(), Some(chain_id))
        }
        Command::Explorer {
            token_address: Some(address),
            token_id: Some(token_id),
            ..
        } => {
            let clients = Clients::new(&args, &config)?;
            collect_token(&clients, *address, TokenId::new(token_id.as_str()), &output).await
        }
        Command::Explorer { crawl, .. } => {
            let config = config.with_crawl(crawl);
            let clients = Clients::new(&args, &config)?;
            let mut collector = Collector::new(config.resolve_workers);
            collect_explorer(&clients, &config, &mut collector).await;
            output.collection(collector.records(), None)
        }
        Command::All { probe, crawl } => {
            let config = config.with_probe(probe).with_crawl(crawl);
            let clients = Clients::new(&args, &config)?;
            let chain_id = connect(clients.node.as_ref(), &args).await?;
            let mut collector = Collector::new(config.resolve_workers);
            collect_explorer(&clients, &config, &mut collector).await;
            collect_chain(
                clients.node.clone(),
                clients.fetcher.clone(),
                &config,
                &probe.addresses,
                &mut collector,
            )
            .await?;
            output.collection(collector.records(), Some(chain_id))
        }
    }
}

async fn connect(node: &dyn EthNodeReading, args: &Args) -> Result<u64> {
    let chain_id = node
        .chain_id()
        .await
        .with_context(|| format!("failed to connect to node at {}", args.rpc_url))?;
    tracing::info!("connected to chain {chain_id} via {}", args.rpc_url);
    Ok(chain_id)
}

/// Known collections, then `extra`, then whatever the log scan finds.
async fn chain_addresses(
    node: &dyn EthNodeReading,
    config: &CollectorConfig,
    extra: &[Address],
) -> Result<Vec<Address>> {
    let mut addresses = known_collections();
    addresses.extend_from_slice(extra);
    if let Some(scan) = &config.scan {
        let end = match scan.end {
            Some(end) => end,
            None => node.block_number().await.context("latest block")?,
        };
        addresses.extend(scan_for_contracts(node, scan.start, end).await);
    }
    let mut seen = HashSet::new();
    addresses.retain(|address| seen.insert(*address));
    Ok(addresses)
}

/// Collections already covered by an earlier source are dropped before any
/// contract details are requested for them.
async fn collect_chain(
    node: Arc<dyn EthNodeReading>,
    fetcher: Arc<dyn MetadataFetching>,
    config: &CollectorConfig,
    extra: &[Address],
    collector: &mut Collector,
) -> Result<()> {
    let mut addresses = chain_addresses(node.as_ref(), config, extra).await?;
    addresses.retain(|address| !collector.is_processed(address));
    let source = ChainSource::new(node, fetcher, addresses, config.probe.clone());
    collector.collect(&source).await;
    Ok(())
}

async fn collect_explorer(clients: &Clients, config: &CollectorConfig, collector: &mut Collector) {
    let transfers = TransferSource::load(
        clients.explorer.clone(),
        PAGE_SIZE,
        config.max_transfer_pages,
    )
    .await;
    collector.collect(&transfers).await;
    let instances = InstanceSource::new(clients.explorer.clone(), config.paging.clone());
    collector.collect(&instances).await;
}

async fn collect_contract(
    clients: &Clients,
    config: &CollectorConfig,
    address: Address,
    output: &Output,
) -> Result<()> {
    let source = ChainSource::new(
        clients.node.clone(),
        clients.fetcher.clone(),
        vec![address],
        config.probe.clone(),
    );
    let container = source.container(address).await;
    let mut collector = Collector::new(config.resolve_workers);
    collector.collect_from(&source, vec![container.clone()]).await;
    let records = collector.records();
    if records.is_empty() {
        println!("No tokens found for contract {address}");
        return Ok(());
    }
    write_json(&output.path, &ContractDocument::new(&container, records), output.pretty)?;
    println!(
        "Found {} assets for contract {address}\nOutput written to {}",
        records.len(),
        output.path.display()
    );
    Ok(())
}

async fn collect_token(
    clients: &Clients,
    address: Address,
    token_id: TokenId,
    output: &Output,
) -> Result<()> {
    let Some(record) = fetch_single_asset(&clients.explorer, address, token_id.clone()).await? else {
        println!("Token {address}:{token_id} not found");
        return Ok(());
    };
    write_json(&output.path, &record, output.pretty)?;
    println!(
        "Token {address}:{token_id} written to {}",
        output.path.display()
    );
    Ok(())
}

struct Output {
    path: PathBuf,
    pretty: bool,
}

impl Output {
    /// Writes the collection document and prints the summary. Nothing is
    /// written without assets.
    fn collection(&self, records: &[AssetRecord], chain_id: Option<u64>) -> Result<()> {
        if records.is_empty() {
            println!("No assets found");
            return Ok(());
        }
        write_json(
            &self.path,
            &CollectionDocument::new(records, chain_id),
            self.pretty,
        )?;
        print!("{}", Summary::from_records(records));
        println!("Output written to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::BlockScan,
        models::Container,
        sources::ProbeConfig,
        testing::{MockNode, StaticTransport},
    };
    use maplit::hashmap;

    #[tokio::test]
    async fn addresses_without_scan() {
        let node = MockNode::default();
        let extra = [known_collections()[0], Address::from(9)];
        let addresses = chain_addresses(&node, &CollectorConfig::default(), &extra)
            .await
            .unwrap();
        let mut expected = known_collections();
        expected.push(Address::from(9));
        assert_eq!(addresses, expected);
        assert!(node.scanned_windows().is_empty());
    }

    #[tokio::test]
    async fn addresses_with_scan_to_latest_block() {
        let node = MockNode {
            emitters: hashmap! {
                0 => vec![Address::from(1)],
                2_000 => vec![Address::from(2), known_collections()[1]],
            },
            ..Default::default()
        };
        let config = CollectorConfig {
            scan: Some(BlockScan {
                start: 0,
                end: None,
            }),
            ..Default::default()
        };
        let addresses = chain_addresses(&node, &config, &[]).await.unwrap();
        assert_eq!(node.scanned_windows().last(), Some(&(2_000, 2_500)));
        let mut expected = known_collections();
        expected.extend([Address::from(1), Address::from(2)]);
        assert_eq!(addresses, expected);
    }

    #[tokio::test]
    async fn processed_collections_are_not_described() {
        let node = Arc::new(MockNode::default());
        let fetcher: Arc<dyn MetadataFetching> =
            Arc::new(Homebrew::new(Arc::new(StaticTransport::default())));
        let config = CollectorConfig {
            probe: ProbeConfig {
                max_ids: Some(1),
                ..Default::default()
            },
            ..Default::default()
        };
        let known = known_collections();
        let earlier = ChainSource::new(node.clone(), fetcher.clone(), vec![], config.probe.clone());
        let mut collector = Collector::new(config.resolve_workers);
        collector
            .collect_from(&earlier, vec![Container::new(known[0])])
            .await;

        collect_chain(node.clone(), fetcher, &config, &[], &mut collector)
            .await
            .unwrap();
        assert_eq!(node.described_contracts(), known[1..].to_vec());
    }

    #[test]
    fn no_output_without_assets() {
        let path = std::env::temp_dir().join(format!(
            "asset-collector-empty-{}.json",
            std::process::id()
        ));
        let output = Output {
            path: path.clone(),
            pretty: false,
        };
        output.collection(&[], Some(1315)).unwrap();
        assert!(!path.exists());
    }
}
