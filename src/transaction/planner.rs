//! Universal Router command and Infinity action planners.

use crate::core::abi::{InfinityExactInputParams, PermitSingle};
use alloy::primitives::aliases::U24;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolValue;

/// Universal Router command bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    V3SwapExactIn = 0x00,
    Permit2TransferFrom = 0x02,
    Sweep = 0x04,
    PayPortion = 0x06,
    V2SwapExactIn = 0x08,
    Permit2Permit = 0x0a,
    WrapEth = 0x0b,
    UnwrapWeth = 0x0c,
    InfiSwap = 0x10,
    StableSwapExactIn = 0x22,
}

/// Infinity router action bytes carried inside `INFI_SWAP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InfinityAction {
    ClSwapExactIn = 0x07,
    Settle = 0x0b,
    Take = 0x0e,
    BinSwapExactIn = 0x1d,
}

/// Accumulates `(commands, inputs)` for `execute`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePlanner {
    pub commands: Vec<u8>,
    pub inputs: Vec<Bytes>,
}

impl RoutePlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_command(&mut self, command: CommandType, input: Vec<u8>) {
        self.commands.push(command as u8);
        self.inputs.push(Bytes::from(input));
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn permit2_permit(&mut self, permit: &PermitSingle, signature: Bytes) {
        self.add_command(
            CommandType::Permit2Permit,
            (permit.clone(), signature).abi_encode_params(),
        );
    }

    pub fn permit2_transfer_from(&mut self, token: Address, recipient: Address, amount: U256) {
        self.add_command(
            CommandType::Permit2TransferFrom,
            (token, recipient, amount).abi_encode_params(),
        );
    }

    pub fn wrap_eth(&mut self, recipient: Address, amount: U256) {
        self.add_command(CommandType::WrapEth, (recipient, amount).abi_encode_params());
    }

    pub fn unwrap_weth(&mut self, recipient: Address, amount_min: U256) {
        self.add_command(CommandType::UnwrapWeth, (recipient, amount_min).abi_encode_params());
    }

    pub fn sweep(&mut self, token: Address, recipient: Address, amount_min: U256) {
        self.add_command(CommandType::Sweep, (token, recipient, amount_min).abi_encode_params());
    }

    pub fn pay_portion(&mut self, token: Address, recipient: Address, bips: U256) {
        self.add_command(CommandType::PayPortion, (token, recipient, bips).abi_encode_params());
    }

    pub fn v2_swap_exact_in(
        &mut self,
        recipient: Address,
        amount_in: U256,
        amount_out_min: U256,
        path: Vec<Address>,
        payer_is_user: bool,
    ) {
        self.add_command(
            CommandType::V2SwapExactIn,
            (recipient, amount_in, amount_out_min, path, payer_is_user).abi_encode_params(),
        );
    }

    pub fn v3_swap_exact_in(
        &mut self,
        recipient: Address,
        amount_in: U256,
        amount_out_min: U256,
        path: Bytes,
        payer_is_user: bool,
    ) {
        self.add_command(
            CommandType::V3SwapExactIn,
            (recipient, amount_in, amount_out_min, path, payer_is_user).abi_encode_params(),
        );
    }

    pub fn stable_swap_exact_in(
        &mut self,
        recipient: Address,
        amount_in: U256,
        amount_out_min: U256,
        path: Vec<Address>,
        flags: Vec<U256>,
        payer_is_user: bool,
    ) {
        self.add_command(
            CommandType::StableSwapExactIn,
            (recipient, amount_in, amount_out_min, path, flags, payer_is_user).abi_encode_params(),
        );
    }

    pub fn infi_swap(&mut self, actions: ActionsPlanner) {
        self.add_command(CommandType::InfiSwap, actions.finalize());
    }
}

/// Accumulates Infinity router actions for one `INFI_SWAP` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionsPlanner {
    pub actions: Vec<u8>,
    pub params: Vec<Bytes>,
}

impl ActionsPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_action(&mut self, action: InfinityAction, param: Vec<u8>) {
        self.actions.push(action as u8);
        self.params.push(Bytes::from(param));
    }

    pub fn swap_exact_in(&mut self, action: InfinityAction, params: &InfinityExactInputParams) {
        self.add_action(action, params.abi_encode());
    }

    pub fn settle(&mut self, currency: Address, amount: U256, payer_is_user: bool) {
        self.add_action(
            InfinityAction::Settle,
            (currency, amount, payer_is_user).abi_encode_params(),
        );
    }

    pub fn take(&mut self, currency: Address, recipient: Address, amount: U256) {
        self.add_action(InfinityAction::Take, (currency, recipient, amount).abi_encode_params());
    }

    /// `abi.encode(bytes actions, bytes[] params)`
    pub fn finalize(self) -> Vec<u8> {
        (Bytes::from(self.actions), self.params).abi_encode_params()
    }
}

/// V3 packed path: `token (20) | fee (3) | token (20) | ...`.
pub fn encode_v3_path(tokens: &[Address], fees: &[u32]) -> Bytes {
    let mut path = Vec::with_capacity(tokens.len() * 20 + fees.len() * 3);
    for (i, token) in tokens.iter().enumerate() {
        path.extend_from_slice(token.as_slice());
        if let Some(fee) = fees.get(i) {
            path.extend_from_slice(&U24::from(*fee).to_be_bytes::<3>());
        }
    }
    Bytes::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_v3_path_layout() {
        let a = address!("bb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c");
        let b = address!("55d398326f99059ff775485246999027b3197955");
        let path = encode_v3_path(&[a, b], &[500]);

        assert_eq!(path.len(), 43);
        assert_eq!(&path[..20], a.as_slice());
        assert_eq!(&path[20..23], &[0x00, 0x01, 0xf4]);
        assert_eq!(&path[23..], b.as_slice());
    }

    #[test]
    fn test_planner_tracks_commands() {
        let mut planner = RoutePlanner::new();
        planner.wrap_eth(Address::repeat_byte(2), U256::from(1));
        planner.sweep(Address::ZERO, Address::repeat_byte(1), U256::ZERO);

        assert_eq!(planner.commands, vec![0x0b, 0x04]);
        assert_eq!(planner.inputs.len(), 2);
        // two static words / three static words
        assert_eq!(planner.inputs[0].len(), 64);
        assert_eq!(planner.inputs[1].len(), 96);
    }

    #[test]
    fn test_actions_decode_back() {
        let mut actions = ActionsPlanner::new();
        actions.settle(Address::ZERO, U256::from(7), true);
        actions.take(Address::repeat_byte(9), Address::repeat_byte(1), U256::ZERO);

        let encoded = actions.finalize();
        let (kinds, params) = <(Bytes, Vec<Bytes>)>::abi_decode_params(&encoded).unwrap();
        assert_eq!(kinds.to_vec(), vec![0x0b, 0x0e]);
        assert_eq!(params.len(), 2);

        let (currency, amount, payer) = <(Address, U256, bool)>::abi_decode_params(&params[0]).unwrap();
        assert_eq!(currency, Address::ZERO);
        assert_eq!(amount, U256::from(7));
        assert!(payer);
    }
}
