use crate::models::{DemoDatasetItem, RiskTier};

/// Shortest input that may match a dataset entry by being contained in it.
/// Anything shorter ("Call", "Hello") would hit unrelated entries.
const MIN_PARTIAL_MATCH_LEN: usize = 24;

pub const DEMO_DATASET: &[DemoDatasetItem] = &[
    DemoDatasetItem {
        id: "real-1",
        label: "Real: Wallet Credit Scam",
        text: "CREDITED: Rs.75 wallet money. Use it to order medicines and get FLAT 22% OFF. Code: PHMY22 *TC PharmEasy https://peasy.in/RjXCN6",
        risk_tier: RiskTier::Medium,
        fraud_type: "Promotional Scam",
        explanation: "Uses shortened URL (peasy.in) and promotional tactics. While could be legitimate, the URL shortener hides the true destination.",
    },
    DemoDatasetItem {
        id: "real-2",
        label: "Real: Discount Offer",
        text: "Get clientele HELP Cover today. Debi check and we will cover your premium this December. Yes =call. No=out. AUTHFSP. T&C bit.ly/tc.CL.NO.=OptOut",
        risk_tier: RiskTier::Medium,
        fraud_type: "Financial Scam",
        explanation: "Uses bit.ly shortener and unclear terms. Requests immediate action (Yes=call) which is a pressure tactic.",
    },
    DemoDatasetItem {
        id: "real-3",
        label: "Real: Data Deal",
        text: "Get a SPECIAL DATA DEAL of 2GB for sh. 100 valid 24hrs by clicking on https://bit.ly/Safaricomapp or Dial *544*21# and keep the connections going.",
        risk_tier: RiskTier::Medium,
        fraud_type: "Promotional",
        explanation: "Uses URL shortener (bit.ly) which could hide malicious links. Limited time offer (24hrs) creates urgency.",
    },
    DemoDatasetItem {
        id: "real-4",
        label: "Real: Account Statement Scam",
        text: "PRIVATE! Your 2003 Account Statement for 07815296484 shows 800 un-redeemed S.I.M. points. Call 08718738001 Identifier Code 41782 Expires 18/11/04",
        risk_tier: RiskTier::High,
        fraud_type: "Phishing",
        explanation: "Classic phishing attempt. Uses urgency (expiration date), unredeemed points lure, and requests calling a premium number.",
    },
    DemoDatasetItem {
        id: "real-5",
        label: "Real: Ringtone Subscription",
        text: "Thanks for your subscription to Ringtone UK your mobile will be charged £5/month Please confirm by replying YES or NO. If you reply NO you will not be charged",
        risk_tier: RiskTier::High,
        fraud_type: "Subscription Scam",
        explanation: "Claims you subscribed without consent. Charges £5/month. Trick: replying YES or NO both confirm your number is active.",
    },
    DemoDatasetItem {
        id: "real-6",
        label: "Real: Free Mobile Scam",
        text: "07732584351 - Rodger Burns - MSG = We tried to call you re your reply to our sms for a free nokia mobile + free camcorder. Please call now 08000930705 for delivery tomorrow",
        risk_tier: RiskTier::Critical,
        fraud_type: "Prize Scam",
        explanation: "Classic 'free prize' scam. Claims you replied to get free items. Urgency (delivery tomorrow) and premium rate number call.",
    },
    DemoDatasetItem {
        id: "bank-kyc",
        label: "Pattern: Bank KYC Block",
        text: "Dear Customer, Your SBI Bank Account has been blocked by 5:00 PM. Please update your PAN card immediately: http://bit.ly/sbikyc",
        risk_tier: RiskTier::Critical,
        fraud_type: "Phishing",
        explanation: "Account-blocking deadline, PAN card request and a shortened link posing as SBI KYC.",
    },
    DemoDatasetItem {
        id: "otp-share",
        label: "Pattern: OTP Sharing Scam",
        text: "Dear user, your HDFC account will be suspended today. Share the OTP sent to your mobile with our executive to keep your account active.",
        risk_tier: RiskTier::Critical,
        fraud_type: "Identity Theft",
        explanation: "Asks for a one-time password under threat of suspension. No bank ever asks customers to share an OTP.",
    },
    DemoDatasetItem {
        id: "lottery",
        label: "Pattern: KBC Lottery",
        text: "Congratulation! Your number has won 25,00,000 in KBC Lottery. Call Rana Pratap Singh 9876543210",
        risk_tier: RiskTier::High,
        fraud_type: "Prize Scam",
        explanation: "Unsolicited lottery win with a large amount and a personal name standing in for an authority.",
    },
    DemoDatasetItem {
        id: "job",
        label: "Pattern: Part-time Job",
        text: "Part time job! Earn Rs 5000-10000 daily working from home. No investment. Contact WhatsApp: wa.me/9199xxxxxx",
        risk_tier: RiskTier::High,
        fraud_type: "Job Scam",
        explanation: "Unrealistic earnings, WhatsApp redirection and the classic no-investment hook.",
    },
    DemoDatasetItem {
        id: "electricity",
        label: "Pattern: Electricity Disconnection",
        text: "Dear User, your electricity power will be disconnected tonight at 9:30 PM because your previous month bill was not updated. Call 890xxxx",
        risk_tier: RiskTier::Critical,
        fraud_type: "Utility Scam",
        explanation: "Disconnection threat with a same-night deadline and a personal phone number instead of the utility's helpline.",
    },
    DemoDatasetItem {
        id: "loan",
        label: "Pattern: Pre-approved Loan",
        text: "Pre-approved Personal Loan of Rs 5 Lakhs credited to your wallet. Click to claim: http://loan-bazaar.xyz",
        risk_tier: RiskTier::Medium,
        fraud_type: "Loan Scam",
        explanation: "Unsolicited pre-approved credit with a claim link on a high-risk domain.",
    },
    DemoDatasetItem {
        id: "safe-1",
        label: "Safe: Normal Conversation",
        text: "Hello! How's you and how did saturday go? I was just texting to see if you'd decided to do anything tomo. Not that i'm trying to invite myself or anything!",
        risk_tier: RiskTier::Low,
        fraud_type: "None",
        explanation: "Normal casual conversation between friends. No fraud indicators present.",
    },
    DemoDatasetItem {
        id: "safe-2",
        label: "Safe: Bank Query",
        text: "Sir, I need AXIS BANK account no and bank address.",
        risk_tier: RiskTier::Low,
        fraud_type: "None",
        explanation: "Simple information request. No urgency, threats, or suspicious links.",
    },
];

/// Reference patterns embedded in the model prompt.
pub const FEW_SHOT_EXAMPLES: &str = r#"REFERENCE FRAUD DATABASE (LOCAL DATASET PATTERNS):
1. [DATASET_BANK_01]: "Dear Customer, Your SBI Bank Account has been blocked by 5:00 PM. Please update your PAN card immediately: http://bit.ly/sbikyc" -> Risk: CRITICAL. Signals: Urgency (5:00 PM), Account Blocked, Short Link.
2. [DATASET_LOTTERY_02]: "Congratulation! Your number has won 25,00,000 in KBC Lottery. Call Rana Pratap Singh 9876543210" -> Risk: HIGH. Signals: Lottery, Large Amount, Personal Name for Authority.
3. [DATASET_JOB_03]: "Part time job! Earn Rs 5000-10000 daily working from home. No investment. Contact WhatsApp: wa.me/9199xxxxxx" -> Risk: HIGH. Signals: Unrealistic Earnings, WhatsApp Redirection, No Investment trap.
4. [DATASET_ELECTRICITY_04]: "Dear User, your electricity power will be disconnected tonight at 9:30 PM because your previous month bill was not updated. Call 890xxxx" -> Risk: CRITICAL. Signals: Utility Disconnection, Tonight Deadline, Personal Number.
5. [DATASET_LOAN_05]: "Pre-approved Personal Loan of Rs 5 Lakhs credited to your wallet. Click to claim: http://loan-bazaar.xyz" -> Risk: MEDIUM/HIGH. Signals: Pre-approved, Wallet Credit, Suspicious Domain."#;

pub fn find_by_id(id: &str) -> Option<&'static DemoDatasetItem> {
    DEMO_DATASET.iter().find(|item| item.id == id)
}

/// Finds the dataset entry an input corresponds to: either the input quotes
/// the entry, or the input is a long enough excerpt of it. Whitespace runs
/// and letter case are ignored.
pub fn find_match(text: &str) -> Option<&'static DemoDatasetItem> {
    let input = normalize(text);
    if input.is_empty() {
        return None;
    }

    DEMO_DATASET.iter().find(|item| {
        let entry = normalize(item.text);
        input.contains(&entry)
            || (input.chars().count() >= MIN_PARTIAL_MATCH_LEN && entry.contains(&input))
    })
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let mut ids: Vec<&str> = DEMO_DATASET.iter().map(|item| item.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), DEMO_DATASET.len());
    }

    #[test]
    fn matches_when_input_quotes_an_entry() {
        let input = format!("Forwarded:\n{}\nis this real?", DEMO_DATASET[3].text);
        assert_eq!(find_match(&input).map(|item| item.id), Some("real-4"));
    }

    #[test]
    fn matches_long_excerpts_ignoring_case_and_spacing() {
        let input = "your   electricity POWER will be disconnected tonight";
        assert_eq!(find_match(input).map(|item| item.id), Some("electricity"));
    }

    #[test]
    fn short_or_empty_input_never_matches() {
        assert!(find_match("").is_none());
        assert!(find_match("   ").is_none());
        assert!(find_match("Call").is_none());
    }

    #[test]
    fn finds_entries_by_id() {
        assert_eq!(find_by_id("safe-2").map(|item| item.risk_tier), Some(RiskTier::Low));
        assert!(find_by_id("missing").is_none());
    }
}
