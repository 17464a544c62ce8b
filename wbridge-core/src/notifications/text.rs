use wbridge_sdk::objects::{Asset, ProposalStatus, Transaction, TxDirection, TxType, WalletInfo};

/// Text of the desktop notification for a new transaction, if it deserves
/// one.
///
/// Only received regular transactions, votes and revocations are
/// announced. When more than one wallet is open the text names the wallet.
pub fn transaction_notification(
    transaction: &Transaction,
    wallet: &WalletInfo,
    opened_wallets: usize,
) -> Option<String> {
    let text = match transaction.tx_type {
        TxType::Regular if transaction.direction == TxDirection::Received => format!(
            "You have received {} {}",
            wallet.asset.to_coin(transaction.amount),
            wallet.asset.ticker()
        ),
        TxType::Vote => format!(
            "A ticket just voted\nVote reward: {} DCR",
            Asset::Dcr.to_coin(transaction.vote_reward)
        ),
        TxType::Revocation => "A ticket was revoked".to_owned(),
        _ => return None,
    };

    if opened_wallets > 1 {
        Some(format!("[{}] {text}", wallet.name))
    } else {
        Some(text)
    }
}

/// Text of the desktop notification for a proposal update. The end of a
/// proposal sync is not announced.
pub fn proposal_notification(proposal_name: &str, status: ProposalStatus) -> Option<String> {
    match status {
        ProposalStatus::Synced => None,
        ProposalStatus::NewProposal => Some(format!("A new proposal has been added: {proposal_name}")),
        ProposalStatus::VoteStarted => Some(format!("Voting has started for proposal: {proposal_name}")),
        ProposalStatus::VoteFinished => Some(format!("Voting has ended for proposal: {proposal_name}")),
    }
}
