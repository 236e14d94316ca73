//! Shared fixtures for the integration tests

use car_scout::config::{Config, SourceConfig};

/// Creates a test configuration pointed at a mock upstream
pub fn test_config(upstream_uri: &str) -> Config {
    let mut config = Config::default();
    config.source = SourceConfig {
        base_url: format!("{}/", upstream_uri),
        ..SourceConfig::default()
    };
    config.http.request_timeout_ms = 2_000;
    config.http.detail_timeout_ms = 1_000;
    config
}

/// One listing block on a result page
pub struct Row<'a> {
    pub id: u32,
    pub title: &'a str,
    pub price: &'a str,
    pub location: &'a str,
    pub image: bool,
}

impl<'a> Row<'a> {
    pub fn new(id: u32, location: &'a str) -> Self {
        Self {
            id,
            title: "Škoda Octavia",
            price: "125 000 Kč",
            location,
            image: true,
        }
    }

    /// A block with nothing but the title link
    pub fn bare(id: u32) -> Self {
        Self {
            id,
            title: "Škoda Fabia",
            price: "",
            location: "",
            image: false,
        }
    }
}

/// Renders a search result page in the marketplace's row template
pub fn results_page(rows: &[Row<'_>]) -> String {
    let body: String = rows
        .iter()
        .map(|row| {
            let image = if row.image {
                format!(
                    r#"<a href="/inzerat/{id}/auto.php"><img src="/img/{id}.jpg" class="obrazek"></a>"#,
                    id = row.id
                )
            } else {
                String::new()
            };
            let price = if row.price.is_empty() {
                String::new()
            } else {
                format!(r#"<div class="inzeratycena"><b>{}</b></div>"#, row.price)
            };
            let location = if row.location.is_empty() {
                String::new()
            } else {
                format!(r#"<div class="inzeratylok">{}</div>"#, row.location)
            };
            format!(
                r#"<div class="inzeraty inzeratyflex">
                    <div class="inzeratynadpis">{image}
                      <h2 class="nadpis"><a href="/inzerat/{id}/auto.php">{title} {id}</a></h2>
                    </div>
                    {price}{location}
                </div>"#,
                id = row.id,
                title = row.title,
            )
        })
        .collect();

    format!(
        r#"<html><head><title>Osobní auta</title></head><body>
        <div class="nadpis"><a href="/osobni/">Osobní auta</a></div>
        {}
        </body></html>"#,
        body
    )
}

/// Renders a listing detail page
pub fn detail_page(postal: &str, city: &str, price: &str) -> String {
    format!(
        r#"<html><head>
        <meta name="description" content="Prodám vůz v dobrém stavu. Cena: {price}, Lokalita: {city}">
        <meta property="og:image" content="/img/detail.jpg">
        </head><body>
        <table><tr><td class="listadvlevo"><table>
          <tr><td>Jméno:</td><td><b>Jan</b></td></tr>
          <tr><td>Lokalita:</td><td><a href="/mapa/">{postal}</a> <a href="/mapa/">{city}</a></td></tr>
          <tr><td>Cena:</td><td><b>{price}</b></td></tr>
        </table></td></tr></table>
        </body></html>"#
    )
}
