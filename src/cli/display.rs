use crate::authorization::{AuthState, Authorization};
use crate::core::Percent;
use crate::trade::{RouteType, Trade};
use crate::transaction::{FeeOptions, MethodParameters, SwapReceipt};
use crate::utils::format_amount;
use alloy::primitives::hex;
use colored::*;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Terminal rendering for the swap command
pub struct SwapDisplay;

impl SwapDisplay {
    /// Display a prepared trade before the confirmation prompt
    pub fn display_trade(trade: &Trade, slippage: &Percent, fee: Option<&FeeOptions>) {
        println!("\n{}", style("💱 Best Trade").bold().underlined());
        println!(
            "Swap: {} → {}",
            trade.input_amount.to_string().bold(),
            trade.output_amount.to_string().bold()
        );

        let output = trade.output_currency();
        println!(
            "Min Output: {} {} ({} slippage)",
            format_amount(trade.minimum_amount_out(slippage), output.decimals()),
            output.symbol(),
            slippage
        );
        if let Some(fee) = fee {
            println!("Fee: {} to {}", fee.fee, fee.recipient);
        }
        println!(
            "Gas: ~{} units ≈ {} {}",
            trade.gas_estimate,
            format_amount(trade.gas_cost_in_quote, output.decimals()),
            output.symbol()
        );

        println!("\n{} ({})", style("Routes").bold(), trade.routes.len());
        for route in &trade.routes {
            let symbols: Vec<&str> = route.path.iter().map(|c| c.symbol()).collect();
            println!(
                "{} {} {}% {}",
                style("►").cyan(),
                color_route_type(route.route_type).bold(),
                route.percent,
                symbols.join(" → ")
            );
            println!(
                "  {} → {}",
                route.input_amount,
                route.output_amount
            );
            for pool in &route.pools {
                println!("  {}", style(pool.to_string()).dim());
            }
        }
    }

    pub fn display_authorization(authorization: &Authorization) {
        let states: Vec<String> = authorization.trace.iter().map(|s| s.to_string()).collect();
        let final_state = match authorization.final_state() {
            AuthState::NoAction => "no approval needed".green(),
            AuthState::Ready => "permit signed".green(),
            _ => "incomplete".red(),
        };
        println!(
            "\nAuthorization: {} ({})",
            final_state,
            style(states.join(" → ")).dim()
        );
        if let Some(hash) = &authorization.approval_tx {
            println!("Approval Tx: {}", style(hash.to_string()).dim());
        }
        if let Some(amount) = authorization.skipped_approval {
            println!(
                "{}",
                format!("Approval of {} to Permit2 required, not sent", amount).yellow()
            );
        }
    }

    /// Print the router call for `--dry-run`
    pub fn display_call_data(params: &MethodParameters) {
        println!("\n{}", style("📦 Call Data").bold().underlined());
        println!("To: {}", params.to);
        println!("Value: {}", params.value);
        println!("Data ({} bytes):", params.calldata.len());
        println!("{}", hex::encode_prefixed(&params.calldata));
    }

    /// Create a progress bar for operations
    pub fn create_progress_bar(message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        let spinner = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");
        pb.set_style(spinner);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        pb
    }

    pub fn display_receipt(receipt: &SwapReceipt) {
        println!("\n{}", style("✅ Swap Confirmed!").bold().green());
        println!("Tx Hash: {}", style(receipt.tx_hash.to_string()).dim());
        if let Some(block) = receipt.block_number {
            println!("Block: {}", block);
        }
        println!("Gas Used: {}", receipt.gas_used);
        println!(
            "\n{}",
            style(format!("View on BscScan: https://bscscan.com/tx/{}", receipt.tx_hash)).dim()
        );
    }
}

fn color_route_type(route_type: RouteType) -> ColoredString {
    let label = route_type.to_string();
    match route_type {
        RouteType::InfinityCl => label.yellow(),
        RouteType::InfinityBin => label.magenta(),
        RouteType::Mixed => label.blue(),
    }
}
