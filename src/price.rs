//! Price extraction from free text
//!
//! Listing snippets mix the asking price with model years, mileage, engine
//! power and displacement. Extraction runs in priority order:
//!
//! 1. Currency-tagged numbers (`125 000 Kč`, `89 000,-`); the one with the
//!    most digits wins, since fragments of the full price are shorter.
//! 2. Numbers following a price label (`Cena: …`).
//! 3. Bare numbers of three or more digits that are not followed by a unit,
//!    are not a plausible calendar year and reach the minimum bare price.
//!
//! A price that cannot be confidently parsed is reported as `0`, meaning
//! "unknown", never "free".

use once_cell::sync::Lazy;
use regex::Regex;

/// Currency-tagged number: thousands-grouped or plain digits, then a token
static CURRENCY_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,3}(?:[ \u{a0}.]\d{3})+|\d+)\s*(kč|kc|czk|,-|€|eur)")
        .expect("currency regex")
});

static CURRENCY_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(kč|kc\b|czk|,-|€|eur\b)").expect("currency token regex"));

/// A number of at least three digits, optionally thousands-grouped
static BARE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,3}(?:[ \u{a0}.]\d{3})+\b|\b\d{3,}\b").expect("bare number regex")
});

static ANY_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}(?:[ \u{a0}.]\d{3})+|\d+").expect("number regex"));

static PRICE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcena\s*:?\s*").expect("price label regex"));

/// Units that mark a number as something other than a price
const NON_PRICE_UNITS: &[&str] = &[
    "km", "kw", "ps", "hp", "ccm", "cm3", "cm³", "nm", "mm", "kg", "l", "let", "roků", "roku",
    "roky", "rok", "tis", "mil", "x",
];

/// How far past a price label the number is looked for
const LABEL_WINDOW: usize = 60;

/// Heuristic limits for accepting a number as a price
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRules {
    /// Smallest value accepted without a currency token
    pub min_bare_price: u64,
    /// Inclusive range of values treated as calendar years
    pub year_min: u64,
    pub year_max: u64,
}

impl Default for PriceRules {
    fn default() -> Self {
        Self {
            min_bare_price: 10_000,
            year_min: 1950,
            year_max: 2035,
        }
    }
}

/// Price extractor bound to a set of [`PriceRules`]
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceParser {
    rules: PriceRules,
}

impl PriceParser {
    pub fn new(rules: PriceRules) -> Self {
        Self { rules }
    }

    /// Parser with the default year range and the given bare-price minimum
    pub fn with_min_bare_price(min_bare_price: u64) -> Self {
        Self::new(PriceRules {
            min_bare_price,
            ..PriceRules::default()
        })
    }

    /// Returns the best currency-bearing substring of `text`, or an empty
    /// string when nothing looks like a price
    pub fn extract_price(&self, text: &str) -> String {
        if let Some(found) = self.find_currency_price(text) {
            return found;
        }

        if let Some(found) = self.find_labelled_price(text) {
            return found;
        }

        self.find_bare_price(text).unwrap_or_default()
    }

    /// Longest currency-tagged number in `text`
    pub fn find_currency_price(&self, text: &str) -> Option<String> {
        CURRENCY_NUMBER
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let digits = digit_count(&caps[1]);
                (digits > 0).then(|| (digits, whole.as_str().trim().to_string()))
            })
            // max_by_key keeps the last maximum; prefer the first one instead
            .fold(None::<(usize, String)>, |best, (digits, found)| match best {
                Some((best_digits, _)) if best_digits >= digits => best,
                _ => Some((digits, found)),
            })
            .map(|(_, found)| found)
    }

    fn find_labelled_price(&self, text: &str) -> Option<String> {
        for label in PRICE_LABEL.find_iter(text) {
            let window: String = text[label.end()..].chars().take(LABEL_WINDOW).collect();

            if let Some(found) = self.find_currency_price(&window) {
                return Some(found);
            }

            if let Some(number) = BARE_NUMBER.find(&window) {
                return Some(number.as_str().trim().to_string());
            }
        }
        None
    }

    fn find_bare_price(&self, text: &str) -> Option<String> {
        BARE_NUMBER.find_iter(text).find_map(|number| {
            if followed_by_unit(&text[number.end()..]) {
                return None;
            }

            let value = parse_digits(number.as_str())?;
            if self.is_year(value) || value < self.rules.min_bare_price {
                return None;
            }

            Some(number.as_str().trim().to_string())
        })
    }

    /// Checks whether a raw price string is usable as-is
    ///
    /// Four bare digits look like a year and small bare numbers are more
    /// likely mileage fragments or engine codes, so both are rejected unless
    /// a currency token is present.
    pub fn is_valid_price(&self, price: &str) -> bool {
        let price = price.trim();
        let Some(value) = ANY_NUMBER.find(price).and_then(|m| parse_digits(m.as_str())) else {
            return false;
        };

        if value == 0 {
            return false;
        }

        if has_currency(price) {
            return true;
        }

        let looks_like_year = price.len() == 4 && price.chars().all(|c| c.is_ascii_digit());
        !looks_like_year && value >= self.rules.min_bare_price
    }

    /// Parses free price text into a number, `0` when unknown
    ///
    /// # Examples
    ///
    /// ```
    /// use car_scout::price::parse_price;
    ///
    /// assert_eq!(parse_price("1 500 Kč"), 1500);
    /// assert_eq!(parse_price("10000"), 10000);
    /// assert_eq!(parse_price("9999"), 0);
    /// assert_eq!(parse_price("2025"), 0);
    /// ```
    pub fn parse_price(&self, raw: &str) -> u64 {
        let fragment = self.extract_price(raw);
        if fragment.is_empty() {
            return 0;
        }

        let Some(value) = ANY_NUMBER
            .find(&fragment)
            .and_then(|m| parse_digits(m.as_str()))
        else {
            return 0;
        };

        if has_currency(&fragment) || value >= self.rules.min_bare_price {
            value
        } else {
            0
        }
    }

    /// Clears a price that is a bare year or below the bare minimum
    pub fn repair(&self, price: &str) -> String {
        let price = price.trim();
        if price.is_empty() || has_currency(price) {
            return price.to_string();
        }

        match ANY_NUMBER.find(price).and_then(|m| parse_digits(m.as_str())) {
            Some(value) if !self.is_year(value) && value >= self.rules.min_bare_price => {
                price.to_string()
            }
            _ => String::new(),
        }
    }

    fn is_year(&self, value: u64) -> bool {
        (self.rules.year_min..=self.rules.year_max).contains(&value)
    }
}

/// Returns true if the text carries a currency token
pub fn has_currency(text: &str) -> bool {
    CURRENCY_TOKEN.is_match(text)
}

fn digit_count(text: &str) -> usize {
    text.chars().filter(char::is_ascii_digit).count()
}

fn parse_digits(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn followed_by_unit(rest: &str) -> bool {
    let rest = rest.trim_start().to_lowercase();
    NON_PRICE_UNITS.iter().any(|unit| {
        rest.strip_prefix(unit)
            .map(|after| !after.starts_with(char::is_alphabetic))
            .unwrap_or(false)
    })
}

/// [`PriceParser::extract_price`] with default rules
pub fn extract_price(text: &str) -> String {
    PriceParser::default().extract_price(text)
}

/// [`PriceParser::parse_price`] with default rules
pub fn parse_price(raw: &str) -> u64 {
    PriceParser::default().parse_price(raw)
}

/// [`PriceParser::is_valid_price`] with default rules
pub fn is_valid_price(price: &str) -> bool {
    PriceParser::default().is_valid_price(price)
}
