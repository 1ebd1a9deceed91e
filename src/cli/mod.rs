use clap::Parser;

pub mod commands;
pub mod display;

#[derive(Parser, Debug, Clone)]
#[command(name = "infinity-swap")]
#[command(about = "Best-route swaps across PancakeSwap V2, V3, StableSwap and Infinity pools on BSC", long_about = None)]
pub struct Cli {
    /// Hex private key of the swapping wallet
    #[arg(long = "pk")]
    pub pk: String,

    /// Amount of the input token, in whole units (e.g. 0.05)
    #[arg(long)]
    pub amount: String,

    /// Input token symbol (BNB for the native asset)
    #[arg(long = "fromToken")]
    pub from_token: String,

    /// Output token symbol (BNB for the native asset)
    #[arg(long = "toToken")]
    pub to_token: String,

    /// Stop after building call data and print it
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_required_flags() {
        let cli = Cli::try_parse_from([
            "infinity-swap",
            "--pk",
            "0x01",
            "--amount",
            "0.05",
            "--fromToken",
            "BNB",
            "--toToken",
            "CAKE",
        ])
        .unwrap();

        assert_eq!(cli.amount, "0.05");
        assert_eq!(cli.from_token, "BNB");
        assert_eq!(cli.to_token, "CAKE");
        assert!(!cli.dry_run);
        assert!(!cli.yes);
    }

    #[test]
    fn test_missing_flag_is_rejected() {
        let result = Cli::try_parse_from([
            "infinity-swap",
            "--pk",
            "0x01",
            "--amount",
            "1",
            "--fromToken",
            "USDT",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_value_is_rejected() {
        let result = Cli::try_parse_from([
            "infinity-swap",
            "--pk",
            "--amount",
            "1",
            "--fromToken",
            "USDT",
            "--toToken",
            "CAKE",
        ]);
        assert!(result.is_err());
    }
}
