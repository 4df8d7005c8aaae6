//! Report generation service.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use hisab_shared::types::{AccountId, ChartAccountId};
use rust_decimal::Decimal;

use super::error::ReportError;
use super::types::{
    AccountMismatch, ReconciliationLine, ReconciliationReport, TrialBalanceLine,
    TrialBalanceReport,
};
use crate::account::Account;
use crate::chart::{ChartAccountType, ChartOfAccount};
use crate::ledger::entry::LedgerEntry;

/// Debit and credit totals per chart account.
type Totals = HashMap<ChartAccountId, (Decimal, Decimal)>;

/// Service for generating financial reports.
///
/// Read-only: every function takes snapshots and never mutates ledger state.
pub struct ReportService;

impl ReportService {
    /// Generates a trial balance as of `as_of`.
    ///
    /// Every entry dated on or before `as_of` contributes its double-entry
    /// lines. Lines are ordered by code. With `include_zero_balance` false,
    /// accounts whose balance is zero are omitted; since their debits equal
    /// their credits, the difference is unaffected.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::AccountNotFound` if an entry references a chart
    /// account missing from `chart`.
    pub fn trial_balance<'a>(
        chart: &[ChartOfAccount],
        entries: impl IntoIterator<Item = &'a LedgerEntry>,
        as_of: NaiveDate,
        include_zero_balance: bool,
    ) -> Result<TrialBalanceReport, ReportError> {
        let totals = Self::journal_totals(
            entries
                .into_iter()
                .filter(|entry| entry.transaction_date <= as_of),
        );
        Self::ensure_known(chart, &totals)?;

        let mut lines: Vec<TrialBalanceLine> = chart
            .iter()
            .map(|account| {
                let (debit, credit) = totals
                    .get(&account.id)
                    .copied()
                    .unwrap_or((Decimal::ZERO, Decimal::ZERO));
                TrialBalanceLine {
                    chart_account_id: account.id,
                    code: account.code.clone(),
                    name: account.name.clone(),
                    account_type: account.account_type,
                    status: account.status,
                    debit,
                    credit,
                    balance: account.normal_balance().balance(debit, credit),
                }
            })
            .filter(|line| include_zero_balance || !line.balance.is_zero())
            .collect();
        lines.sort_by(|a, b| a.code.cmp(&b.code));

        let total_debit: Decimal = lines.iter().map(|line| line.debit).sum();
        let total_credit: Decimal = lines.iter().map(|line| line.credit).sum();
        let difference = total_debit - total_credit;

        Ok(TrialBalanceReport {
            as_of,
            include_zero_balance,
            lines,
            total_debit,
            total_credit,
            difference,
            is_balanced: difference.is_zero(),
        })
    }

    /// Reconciles money accounts against the journal.
    ///
    /// For each asset chart account, its journal balance must equal the sum
    /// of `current_balance` of the money accounts linked to it. Each money
    /// account's balance must also equal the signed sum of its own entries,
    /// and its chart account must be one of those asset lines. The sum of
    /// all account balances must equal the sum of the asset ledger balances.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::AccountNotFound` if an entry references a chart
    /// account missing from `chart`.
    pub fn reconcile<'a, I>(
        chart: &[ChartOfAccount],
        accounts: &[Account],
        entries: I,
        generated_at: DateTime<Utc>,
    ) -> Result<ReconciliationReport, ReportError>
    where
        I: IntoIterator<Item = &'a LedgerEntry>,
        I::IntoIter: Clone,
    {
        let entries = entries.into_iter();
        let totals = Self::journal_totals(entries.clone());
        Self::ensure_known(chart, &totals)?;

        let mut signed_by_account: HashMap<AccountId, Decimal> = HashMap::new();
        for entry in entries {
            *signed_by_account.entry(entry.account_id).or_default() += entry.signed_amount();
        }

        let account_mismatches: Vec<AccountMismatch> = accounts
            .iter()
            .filter_map(|account| {
                let ledger_balance = signed_by_account
                    .get(&account.id)
                    .copied()
                    .unwrap_or_default();
                (ledger_balance != account.current_balance).then_some(AccountMismatch {
                    account_id: account.id,
                    current_balance: account.current_balance,
                    ledger_balance,
                })
            })
            .collect();

        let mut lines: Vec<ReconciliationLine> = chart
            .iter()
            .filter(|chart_account| chart_account.account_type == ChartAccountType::Asset)
            .map(|chart_account| {
                let (debit, credit) = totals
                    .get(&chart_account.id)
                    .copied()
                    .unwrap_or((Decimal::ZERO, Decimal::ZERO));
                let linked: Vec<&Account> = accounts
                    .iter()
                    .filter(|account| account.chart_account_id == chart_account.id)
                    .collect();
                let ledger_balance = chart_account.normal_balance().balance(debit, credit);
                let accounts_balance: Decimal =
                    linked.iter().map(|account| account.current_balance).sum();
                ReconciliationLine {
                    chart_account_id: chart_account.id,
                    code: chart_account.code.clone(),
                    name: chart_account.name.clone(),
                    ledger_balance,
                    accounts_balance,
                    difference: ledger_balance - accounts_balance,
                    account_ids: linked.iter().map(|account| account.id).collect(),
                }
            })
            .collect();
        lines.sort_by(|a, b| a.code.cmp(&b.code));

        let unlinked_accounts: Vec<AccountId> = accounts
            .iter()
            .filter(|account| {
                !lines
                    .iter()
                    .any(|line| line.chart_account_id == account.chart_account_id)
            })
            .map(|account| account.id)
            .collect();

        let total_accounts_balance: Decimal = accounts.iter().map(|a| a.current_balance).sum();
        let total_ledger_balance: Decimal = lines.iter().map(|line| line.ledger_balance).sum();
        let is_reconciled = account_mismatches.is_empty()
            && unlinked_accounts.is_empty()
            && lines.iter().all(|line| line.difference.is_zero())
            && total_accounts_balance == total_ledger_balance;

        Ok(ReconciliationReport {
            generated_at,
            lines,
            account_mismatches,
            unlinked_accounts,
            total_accounts_balance,
            total_ledger_balance,
            is_reconciled,
        })
    }

    fn journal_totals<'a>(entries: impl Iterator<Item = &'a LedgerEntry>) -> Totals {
        let mut totals = Totals::new();
        for line in entries.flat_map(LedgerEntry::journal_lines) {
            let (debit, credit) = totals.entry(line.chart_account_id).or_default();
            *debit += line.debit();
            *credit += line.credit();
        }
        totals
    }

    fn ensure_known(chart: &[ChartOfAccount], totals: &Totals) -> Result<(), ReportError> {
        match totals
            .keys()
            .find(|id| !chart.iter().any(|account| account.id == **id))
        {
            Some(missing) => Err(ReportError::AccountNotFound(*missing)),
            None => Ok(()),
        }
    }
}
