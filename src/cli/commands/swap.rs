use crate::authorization::Authorizer;
use crate::cli::{display::SwapDisplay, Cli};
use crate::core::{Config, CurrencyAmount, SwapError, SwapResult, SystemClock, TokenRegistry};
use crate::discovery::{PoolDiscovery, PoolIdRegistry, PoolNormalizer};
use crate::pipeline::{PipelineParts, SwapPipeline, SwapRequest};
use crate::quotes::QuoteEngine;
use crate::selection::{SearchOptions, TradeSearch};
use crate::transaction::ChainClient;
use crate::utils::parse_amount;
use alloy::signers::local::PrivateKeySigner;
use colored::*;
use dialoguer::{theme::ColorfulTheme, Confirm};
use log::info;
use std::sync::Arc;

pub async fn execute(args: Cli, config: Config) -> SwapResult<()> {
    println!("{}", "🥞 PancakeSwap Infinity Swap".bold().cyan());

    // Everything that can be checked offline is checked before connecting
    let tokens = TokenRegistry::bsc();
    let from = tokens.resolve(&args.from_token)?;
    let to = tokens.resolve(&args.to_token)?;
    if from.same_wrapped(&to) {
        return Err(SwapError::InvalidArgument(format!(
            "cannot swap {} for {}",
            from, to
        )));
    }
    let raw = parse_amount(&args.amount, from.decimals())?;
    let signer = parse_signer(&args.pk)?;

    let pb = SwapDisplay::create_progress_bar("Connecting...");
    let client = Arc::new(ChainClient::connect(&config, signer.clone()).await?);
    info!("Using wallet: {}", client.owner());

    if from.is_native() {
        let balance = client.native_balance().await?;
        if balance < raw {
            pb.finish_and_clear();
            return Err(SwapError::InvalidAmount(format!(
                "wallet holds {} but the swap needs {}",
                CurrencyAmount::from_raw(from.clone(), balance),
                CurrencyAmount::from_raw(from.clone(), raw)
            )));
        }
    }

    let registry = match &config.pool_ids_path {
        Some(path) => PoolIdRegistry::load(path)?,
        None => PoolIdRegistry::bundled()?,
    };

    let provider = client.provider();
    let pipeline = SwapPipeline::new(
        PipelineParts {
            discovery: PoolDiscovery::on_chain(provider.clone(), &config, &tokens, registry),
            normalizer: PoolNormalizer::new(tokens.clone()),
            search: TradeSearch::new(
                Arc::new(QuoteEngine::new(provider, &config)),
                SearchOptions::from_config(&config),
            ),
            gas_oracle: client.clone(),
            authorizer: Authorizer::new(client.clone(), Arc::new(signer), Arc::new(SystemClock), &config),
            submitter: client.clone(),
            clock: Arc::new(SystemClock),
        },
        &config,
    );

    pb.set_message("Finding best trade...");
    let request = SwapRequest::exact_input(CurrencyAmount::from_raw(from, raw), to);
    let quoted = match pipeline.quote(request).await {
        Ok(quoted) => quoted,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    println!("Found {} pools", quoted.pools.len());
    let options = pipeline.swap_options(None);
    SwapDisplay::display_trade(&quoted.trade, &options.slippage_tolerance, options.fee.as_ref());

    let proceed = if args.yes {
        true
    } else {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Do you want to proceed with this swap?")
            .default(false)
            .interact()?
    };
    if !proceed {
        println!("{}", "❌ Swap cancelled".yellow());
        return Ok(());
    }

    let pb = SwapDisplay::create_progress_bar("Authorizing input...");
    // a dry run must not send the approval either
    let prepared = if args.dry_run {
        pipeline.finalize_dry_run(quoted).await
    } else {
        pipeline.finalize(quoted).await
    };
    pb.finish_and_clear();
    let prepared = prepared?;
    SwapDisplay::display_authorization(&prepared.authorization);

    if args.dry_run {
        SwapDisplay::display_call_data(&prepared.params);
        println!("{}", "Dry run: nothing submitted".yellow());
        return Ok(());
    }

    let pb = SwapDisplay::create_progress_bar("Submitting swap...");
    match pipeline.submit(&prepared).await {
        Ok(receipt) => {
            pb.finish_and_clear();
            SwapDisplay::display_receipt(&receipt);
            Ok(())
        }
        Err(e) => {
            pb.finish_and_clear();
            println!("{} {}", "❌ Swap failed:".red().bold(), e);
            Err(e)
        }
    }
}

fn parse_signer(pk: &str) -> SwapResult<PrivateKeySigner> {
    pk.trim()
        .parse::<PrivateKeySigner>()
        .map_err(|_| SwapError::InvalidArgument("--pk is not a valid hex private key".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_signer_accepts_prefixed_hex() {
        let key = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
        let signer = parse_signer(key).unwrap();
        assert_eq!(parse_signer(&key[2..]).unwrap().address(), signer.address());
    }

    #[test]
    fn test_parse_signer_rejects_garbage() {
        assert!(matches!(
            parse_signer("not-a-key"),
            Err(SwapError::InvalidArgument(_))
        ));
    }
}
