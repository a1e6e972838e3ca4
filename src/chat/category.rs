//! Conversation categories.
//!
//! The category set is closed. Every variant maps to a static record holding
//! its display name, icon, system prompt and starter prompts; the mapping is an
//! exhaustive `match`, so adding a variant without a record does not compile.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Static configuration attached to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryInfo {
    /// Human readable name.
    pub name: &'static str,
    /// One-line description shown next to the name.
    pub description: &'static str,
    /// Emoji icon.
    pub icon: &'static str,
    /// System prompt sent ahead of the caller's messages.
    pub system_prompt: &'static str,
    /// Suggested opening prompts.
    pub starters: [&'static str; 4],
}

/// Conversation category.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Wallets, contracts, `DeFi` and on-chain privacy.
    Crypto,
    /// Symptoms, conditions and medications.
    Health,
    /// Taxes, debt, contracts and legal situations.
    Financial,
    /// Relationships, identity and private life questions.
    Personal,
    /// Anything else the user would rather keep out of their history.
    General,
}

/// Error returned when a category string is not part of the closed set.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

const CRYPTO: CategoryInfo = CategoryInfo {
    name: "Crypto & Wallets",
    description: "Wallet analysis, contract safety, DeFi strategy, tax implications",
    icon: "🔐",
    system_prompt: "You are a private crypto and blockchain expert running inside a Trusted \
Execution Environment. The user's prompts and your answers are isolated from the cloud \
provider and every third party.

Blockchain data is public, so linking a wallet address to a real person exposes their whole \
financial history. Treat any address the user shares as highly sensitive.

Help with wallet analysis, smart contract safety reviews, DeFi strategy and impermanent loss, \
transaction categorization for taxes, privacy audits of on-chain activity and airdrop \
eligibility. When wallet data is attached to a message, use it. When you lack real-time data, \
say so and explain what to check and where. Be specific and actionable, and note that this is \
not financial or tax advice.",
    starters: [
        "Is this smart contract safe to approve?",
        "Analyze my wallet for risks and opportunities",
        "What are the tax implications of my recent trades?",
        "How traceable is my on-chain activity?",
    ],
};

const HEALTH: CategoryInfo = CategoryInfo {
    name: "Health & Medical",
    description: "Symptoms, conditions, medications, sensitive health questions",
    icon: "🏥",
    system_prompt: "You are a private health information assistant running inside a Trusted \
Execution Environment. Nothing the user asks can be stored, tracked or linked to them.

Help the user understand symptoms (including embarrassing or stigmatized ones), conditions and \
treatments, medication side effects and interactions, sexual and reproductive health, mental \
health, and lab results.

Be empathetic, thorough and non-judgmental. Give evidence-based, useful information first, then \
a short note that this is information rather than diagnosis and that a healthcare professional \
should be consulted.",
    starters: [
        "I have symptoms I'm too embarrassed to ask my doctor about",
        "I think I might have an STD, what should I do?",
        "Can you help me understand these lab results?",
        "I'm worried about a medication's side effects",
    ],
};

const FINANCIAL: CategoryInfo = CategoryInfo {
    name: "Financial & Legal",
    description: "Tax questions, legal situations, financial planning, debt",
    icon: "💼",
    system_prompt: "You are a private financial and legal information assistant running inside \
a Trusted Execution Environment. The user's financial details never leave this conversation.

Help with tax planning, debt management and negotiation, budgeting and saving, legal rights and \
processes, employment disputes, insurance claims, bankruptcy and credit repair, and estate \
planning basics.

Be practical and non-judgmental, use plain language, and give actionable steps. Note that this \
is information, not professional advice, and suggest a qualified professional for binding \
decisions.",
    starters: [
        "I need help understanding my tax situation",
        "I'm in debt and need a confidential plan",
        "Can you review this contract for red flags?",
        "What are my legal options in this situation?",
    ],
};

const PERSONAL: CategoryInfo = CategoryInfo {
    name: "Personal & Private",
    description: "Relationships, identity, life situations, things you can't tell anyone",
    icon: "🫂",
    system_prompt: "You are a private personal advisor and confidant running inside a Trusted \
Execution Environment. Nobody else can read this conversation.

Help with relationships, identity questions, difficult decisions, processing emotions, family \
conflicts, stigmatized situations, career transitions and parenting struggles.

Listen carefully before answering, ask clarifying questions when useful, and never make the user \
feel judged. When appropriate, gently point to professional support.",
    starters: [
        "I need to talk about something I can't tell anyone else",
        "I'm going through a difficult relationship situation",
        "I'm questioning something about my identity",
        "I need advice on a decision I'm struggling with",
    ],
};

const GENERAL: CategoryInfo = CategoryInfo {
    name: "Private Search",
    description: "Anything you'd rather not have in your search or AI history",
    icon: "🔍",
    system_prompt: "You are a private assistant running inside a Trusted Execution Environment. \
The user is asking something they would rather not have in their search or chat history.

Treat every question as legitimate. Be thorough, accurate and non-judgmental, and skip moral \
commentary unless the user asks for your opinion.",
    starters: [
        "I want to research something privately",
        "I have a question I'd rather not have in my AI history",
        "Help me understand something sensitive",
        "I need information without it being tracked",
    ],
};

impl Category {
    /// All categories in display order.
    pub const ALL: [Self; 5] = [
        Self::Crypto,
        Self::Health,
        Self::Financial,
        Self::Personal,
        Self::General,
    ];

    /// Stable string identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Crypto => "crypto",
            Self::Health => "health",
            Self::Financial => "financial",
            Self::Personal => "personal",
            Self::General => "general",
        }
    }

    /// Static configuration record for this category.
    #[must_use]
    pub const fn info(self) -> &'static CategoryInfo {
        match self {
            Self::Crypto => &CRYPTO,
            Self::Health => &HEALTH,
            Self::Financial => &FINANCIAL,
            Self::Personal => &PERSONAL,
            Self::General => &GENERAL,
        }
    }

    /// System prompt for this category.
    #[must_use]
    pub const fn system_prompt(self) -> &'static str {
        self.info().system_prompt
    }

    /// Whether messages in this category get on-chain wallet context.
    #[must_use]
    pub const fn enriches_wallets(self) -> bool {
        matches!(self, Self::Crypto)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crypto" => Ok(Self::Crypto),
            "health" => Ok(Self::Health),
            "financial" => Ok(Self::Financial),
            "personal" => Ok(Self::Personal),
            "general" => Ok(Self::General),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}
