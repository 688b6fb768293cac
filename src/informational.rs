//! Veto for messages that talk about money without moving it.

use crate::patterns::{library, PatternRule, RuleCategory};

/// The first informational rule that fires, if any.
fn informational_rule(body: &str) -> Option<&'static PatternRule> {
    library().informational.first_match(body)
}

/// Category of the first informational rule that fires, reported in rejections.
pub fn informational_category(body: &str) -> Option<RuleCategory> {
    informational_rule(body).map(|r| r.category())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(body: &str) -> Option<&'static str> {
        informational_category(body).map(|c| c.key())
    }

    #[test]
    fn test_expiry_notice() {
        assert_eq!(
            category("Your Jio plan will expire today. Recharge before due date."),
            Some("expiry")
        );
        assert_eq!(category("Pack validity ends on 12-Mar"), Some("expiry"));
    }

    #[test]
    fn test_otp_is_case_insensitive() {
        assert_eq!(category("OTP is 834521 for your transaction. Do not share."), Some("otp"));
        assert_eq!(category("482913 is your otp for login"), Some("otp"));
        assert_eq!(category("Use verification code 1234"), Some("otp"));
    }

    #[test]
    fn test_balance_inquiry() {
        assert_eq!(category("Your A/c balance is Rs 12,400.00 as on 04-Jan"), Some("balance_inquiry"));
        assert_eq!(category("Balance enquiry for A/c XX1234"), Some("balance_inquiry"));
    }

    #[test]
    fn test_payment_request() {
        assert_eq!(category("RAHUL has requested Rs 500 via UPI"), Some("payment_request"));
        assert_eq!(category("You have a collect request of Rs 200"), Some("payment_request"));
    }

    #[test]
    fn test_bill_due() {
        assert_eq!(category("Electricity bill of Rs 1,240 is due on 15-Feb"), Some("bill_due"));
        assert_eq!(category("Minimum amount due Rs 2,000"), Some("bill_due"));
    }

    #[test]
    fn test_promotion_and_lifecycle() {
        assert_eq!(category("Get upto 50% cashback on flights"), Some("promotion"));
        assert_eq!(category("Your FD no 1234 will mature on 01-04"), Some("account_lifecycle"));
        assert_eq!(category("Your debit card has been activated"), Some("account_lifecycle"));
    }

    #[test]
    fn test_reminder_and_status() {
        assert_eq!(category("Reminder: pay Rs 499 for your broadband"), Some("reminder"));
        assert_eq!(category("Your mobile number is successfully registered for UPI"), Some("status"));
    }

    #[test]
    fn test_real_transactions_pass() {
        for body in [
            "Rs.500.00 debited from A/c XX1234 on 05-01-24 at SWIGGY. Avl Bal Rs 4500.00",
            "Rs 10,000 credited to your A/c XX1234 via NEFT from JOHN DOE",
            "Your credit card bill of Rs 5000 is paid",
            "INR 349.00 spent on HDFC Bank Card XX4421 at AMAZON on 2024-01-05",
        ] {
            assert_eq!(category(body), None, "vetoed a real transaction: {body}");
        }
    }
}
