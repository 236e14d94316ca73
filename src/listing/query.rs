//! Search URL construction for the upstream site

use url::Url;

/// Path of the upstream search endpoint, relative to the source base URL
pub const SEARCH_PATH: &str = "search.php";

/// Category the search is restricted to
pub const CATEGORY: &str = "auto";

/// Location sent along with a search
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocationHint {
    /// No location filter
    None,
    /// A full postal code or a 3-digit prefix
    Postal(String),
    /// Free city text
    City(String),
}

impl LocationHint {
    /// The value placed into the location query parameter
    pub fn as_query_value(&self) -> &str {
        match self {
            Self::None => "",
            Self::Postal(code) => code,
            Self::City(city) => city,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Builds the result page URL for one scrape
///
/// The radius is only sent together with a location.
///
/// ```
/// use car_scout::listing::{build_search_url, LocationHint};
/// use url::Url;
///
/// let base = Url::parse("https://auto.bazos.cz/").unwrap();
/// let url = build_search_url(&base, "octavia", &LocationHint::Postal("27724".into()), 25);
/// assert_eq!(url.path(), "/search.php");
/// assert!(url.query().unwrap().contains("hlokalita=27724"));
/// ```
pub fn build_search_url(
    base_url: &Url,
    keywords: &str,
    location: &LocationHint,
    radius_km: u32,
) -> Url {
    let mut url = base_url
        .join(SEARCH_PATH)
        .unwrap_or_else(|_| base_url.clone());

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        query.append_pair("hledat", keywords.trim());
        query.append_pair("rubriky", CATEGORY);
        query.append_pair("hlokalita", location.as_query_value().trim());
        if location.is_none() {
            query.append_pair("humkreis", "");
        } else {
            query.append_pair("humkreis", &radius_km.to_string());
        }
        query.append_pair("cenaod", "");
        query.append_pair("cenado", "");
        query.append_pair("Submit", "Hledat");
    }

    url
}
