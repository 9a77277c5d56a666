//! Keyword rules for categories and option classes
//!
//! Single words match whole tokens; entries containing a space match as
//! phrases against the normalized text.

use super::text::{normalize_phrase_text, tokenize};
use crate::types::{Category, OptionClass};

const LABEL_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Politics,
        &["politics", "political", "geopolitics", "election", "elections", "us current affairs", "congress", "trump", "government"],
    ),
    (
        Category::Sports,
        &[
            "sports", "sport", "nba", "nfl", "mlb", "nhl", "soccer", "football", "tennis", "golf", "ufc",
            "boxing", "f1", "olympics", "chess", "esports", "cricket", "basketball", "baseball", "hockey",
            "mma", "racing", "ncaa",
        ],
    ),
    (
        Category::Crypto,
        &["crypto", "cryptocurrency", "bitcoin", "ethereum", "nft", "nfts", "defi", "airdrops"],
    ),
    (
        Category::Economics,
        &["economics", "economy", "economic", "business", "finance", "financial", "fed", "inflation", "stocks", "earnings", "commodities", "macro"],
    ),
    (
        Category::Entertainment,
        &["pop culture", "entertainment", "culture", "movies", "music", "celebrities", "tv", "awards", "oscars", "gaming", "art", "mentions", "twitter"],
    ),
    (
        Category::SciTech,
        &["science", "tech", "technology", "ai", "space", "climate", "weather"],
    ),
    (
        Category::World,
        &["world", "global", "international", "ukraine", "israel", "middle east", "war", "conflict"],
    ),
];

const QUESTION_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Politics,
        &[
            "election", "elected", "president", "presidential", "senate", "senator", "congress", "governor",
            "trump", "biden", "harris", "democrat", "democrats", "democratic", "republican", "republicans",
            "gop", "parliament", "minister", "vote", "votes", "primary", "nominee", "nomination", "mayor",
            "impeach", "impeached", "cabinet", "speaker", "electoral", "prime minister", "white house",
        ],
    ),
    (
        Category::Sports,
        &[
            "nba", "nfl", "mlb", "nhl", "ufc", "championship", "playoffs", "finals", "tennis", "golf", "f1",
            "mvp", "league", "touchdown", "goals", "quarterback", "lakers", "celtics", "warriors", "chiefs",
            "eagles", "yankees", "dodgers", "madrid", "barcelona", "arsenal", "liverpool", "wimbledon",
            "super bowl", "world cup", "premier league", "champions league", "grand prix", "grand slam",
            "stanley cup", "world series",
        ],
    ),
    (
        Category::Crypto,
        &[
            "bitcoin", "btc", "$btc", "ethereum", "eth", "$eth", "solana", "sol", "xrp", "doge", "dogecoin",
            "crypto", "memecoin", "binance", "coinbase", "airdrop", "blockchain", "usdt", "usdc",
            "stablecoin", "bnb", "cardano", "pepe", "fdv", "microstrategy",
        ],
    ),
    (
        Category::Economics,
        &[
            "fed", "fomc", "inflation", "cpi", "gdp", "recession", "unemployment", "jobs", "tariff",
            "tariffs", "nasdaq", "dow", "spx", "sp500", "earnings", "treasury", "yield", "yields", "oil",
            "gold", "ipo", "bps", "stock", "stocks", "interest rate", "interest rates", "market cap",
            "rate cut", "rate hike", "s&p",
        ],
    ),
    (
        Category::Entertainment,
        &[
            "movie", "film", "oscar", "oscars", "grammy", "grammys", "emmy", "emmys", "album", "song",
            "spotify", "billboard", "netflix", "taylor", "swift", "celebrity", "tiktok", "youtube",
            "mrbeast", "kardashian", "eurovision", "box office", "rotten tomatoes", "gta", "tweets",
        ],
    ),
    (
        Category::SciTech,
        &[
            "ai", "openai", "gpt", "chatgpt", "gemini", "spacex", "nasa", "starship", "iphone", "apple",
            "google", "microsoft", "anthropic", "quantum", "vaccine", "covid", "pandemic", "hurricane",
            "earthquake", "temperature", "launch",
        ],
    ),
    (
        Category::World,
        &[
            "ukraine", "russia", "israel", "gaza", "iran", "china", "taiwan", "war", "ceasefire", "nato",
            "putin", "zelensky", "invade", "invasion", "hamas", "hezbollah", "korea", "netanyahu",
            "xi", "sanctions",
        ],
    ),
];

const REPLICABLE_ASSETS: &[&str] = &[
    // crypto
    "bitcoin", "btc", "$btc", "ethereum", "eth", "$eth", "solana", "sol", "xrp", "doge", "dogecoin",
    "bnb", "cardano", "ada", "litecoin", "ltc", "avax", "link",
    // indices and equities
    "s&p", "sp500", "spx", "spy", "nasdaq", "qqq", "dow", "djia", "russell", "tesla", "tsla", "nvidia",
    "nvda", "aapl", "msft", "amzn", "googl", "meta", "stock", "shares",
    // commodities
    "gold", "silver", "oil", "wti", "brent", "crude", "natural gas", "copper",
    // fx
    "usd", "eur", "euro", "yen", "jpy", "gbp", "yuan", "dollar", "dxy",
    // rates
    "fed", "fomc", "treasury", "yield", "yields", "interest rate", "interest rates", "10 year",
];

const PRICE_PATTERNS: &[&str] = &[
    "above", "below", "reach", "reaches", "hit", "hits", "close", "closes", "closing", "price",
    "higher", "lower", "dip", "dips", "ath", "cut", "cuts", "hike", "hikes", "bps", "between",
    "up or down", "all time high", "greater than", "less than", "settle", "trade at",
];

/// Normalized text plus its tokens, built once per question
pub struct TextView {
    phrase_text: String,
    tokens: Vec<String>,
}

impl TextView {
    pub fn new(text: &str) -> Self {
        Self {
            phrase_text: format!(" {} ", normalize_phrase_text(text)),
            tokens: tokenize(text),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn matches(&self, keyword: &str) -> bool {
        if keyword.contains(' ') || keyword.contains('&') {
            self.phrase_text.contains(&format!(" {} ", keyword))
        } else {
            self.tokens.iter().any(|t| t == keyword)
        }
    }

    fn count_matches(&self, keywords: &[&str]) -> usize {
        keywords.iter().filter(|k| self.matches(k)).count()
    }

    fn any_match(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.matches(k))
    }
}

/// Map a raw event category label to a [`Category`]; blank labels give `None`,
/// unrecognized ones `Other`
pub fn normalize_label(label: &str) -> Option<Category> {
    if label.trim().is_empty() {
        return None;
    }
    let view = TextView::new(label);
    let found = LABEL_KEYWORDS
        .iter()
        .find(|(_, keywords)| view.any_match(keywords))
        .map(|(category, _)| *category);
    Some(found.unwrap_or(Category::Other))
}

/// Category with the most keyword hits in a question; ties go to the earlier category
pub fn keyword_category(text: &str) -> Option<Category> {
    let view = TextView::new(text);
    let mut best: Option<(Category, usize)> = None;
    for (category, keywords) in QUESTION_KEYWORDS {
        let hits = view.count_matches(keywords);
        if hits > 0 && best.map(|(_, b)| hits > b).unwrap_or(true) {
            best = Some((*category, hits));
        }
    }
    best.map(|(c, _)| c)
}

/// Replicable when the question names an externally traded asset together
/// with a price or threshold condition
pub fn option_class(question: &str) -> OptionClass {
    let view = TextView::new(question);
    let has_asset = view.any_match(REPLICABLE_ASSETS);
    let has_price_condition = view.any_match(PRICE_PATTERNS) || question.contains('$');
    if has_asset && has_price_condition {
        OptionClass::Replicable
    } else {
        OptionClass::Naked
    }
}
