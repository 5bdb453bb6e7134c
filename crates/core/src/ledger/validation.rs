//! Balance checks for ledger entries.

use rust_decimal::Decimal;

use super::entry::MoveLineInput;
use crate::asset::AssetError;

/// Validates that the lines of a new entry balance.
///
/// Zero lines are accepted: a disposal keeps its zero depreciation line.
///
/// # Errors
///
/// Returns `AssetError::UnbalancedMove` if the entry has no line, a negative
/// side, or debits that differ from credits.
pub fn validate_lines(lines: &[MoveLineInput]) -> Result<(), AssetError> {
    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;

    for line in lines {
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(AssetError::UnbalancedMove {
                debit: line.debit,
                credit: line.credit,
            });
        }
        total_debit += line.debit;
        total_credit += line.credit;
    }

    if lines.is_empty() || total_debit != total_credit {
        return Err(AssetError::UnbalancedMove {
            debit: total_debit,
            credit: total_credit,
        });
    }

    Ok(())
}
