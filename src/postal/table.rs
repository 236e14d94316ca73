//! Static postal reference table
//!
//! One row per (postal code, municipality). Codes are stored without the
//! space the post office prints between the third and fourth digit.

use crate::text::normalize_for_match;
use once_cell::sync::Lazy;

/// A row of the reference table with its pre-folded city name
#[derive(Debug, Clone)]
pub struct PostalEntry {
    pub code: &'static str,
    pub city: &'static str,
    pub folded_city: String,
}

pub(crate) static POSTAL_TABLE: Lazy<Vec<PostalEntry>> = Lazy::new(|| {
    let mut entries: Vec<PostalEntry> = RAW_TABLE
        .iter()
        .map(|&(code, city)| PostalEntry {
            code,
            city,
            folded_city: normalize_for_match(city),
        })
        .collect();
    entries.sort_by(|a, b| a.code.cmp(b.code).then_with(|| a.city.cmp(b.city)));
    entries
});

const RAW_TABLE: &[(&str, &str)] = &[
    // Praha
    ("10000", "Praha"),
    ("10100", "Praha"),
    ("10200", "Praha"),
    ("10400", "Praha"),
    ("10700", "Praha"),
    ("10800", "Praha"),
    ("10900", "Praha"),
    ("11000", "Praha"),
    ("11800", "Praha"),
    ("12000", "Praha"),
    ("13000", "Praha"),
    ("14000", "Praha"),
    ("14100", "Praha"),
    ("14200", "Praha"),
    ("14300", "Praha"),
    ("14700", "Praha"),
    ("14800", "Praha"),
    ("14900", "Praha"),
    ("15000", "Praha"),
    ("15200", "Praha"),
    ("15300", "Praha"),
    ("15400", "Praha"),
    ("15500", "Praha"),
    ("15600", "Praha"),
    ("16000", "Praha"),
    ("16100", "Praha"),
    ("16200", "Praha"),
    ("16300", "Praha"),
    ("16400", "Praha"),
    ("16500", "Praha"),
    ("16900", "Praha"),
    ("17000", "Praha"),
    ("17100", "Praha"),
    ("18000", "Praha"),
    ("18100", "Praha"),
    ("18200", "Praha"),
    ("18400", "Praha"),
    ("18600", "Praha"),
    ("19000", "Praha"),
    ("19011", "Praha"),
    ("19012", "Praha"),
    ("19014", "Praha"),
    ("19015", "Praha"),
    ("19016", "Praha"),
    ("19017", "Praha"),
    ("19300", "Praha"),
    ("19600", "Praha"),
    ("19700", "Praha"),
    ("19800", "Praha"),
    ("19900", "Praha"),
    // Středočeský kraj
    ("25001", "Brandýs nad Labem-Stará Boleslav"),
    ("25101", "Říčany"),
    ("25301", "Hostivice"),
    ("26101", "Příbram"),
    ("26601", "Beroun"),
    ("27201", "Kladno"),
    ("27204", "Kladno"),
    ("27401", "Slaný"),
    ("27601", "Mělník"),
    ("27711", "Neratovice"),
    ("27713", "Kostelec nad Labem"),
    ("27714", "Dřísy"),
    ("27715", "Tišice"),
    ("27716", "Všetaty"),
    ("27721", "Liběchov"),
    ("27724", "Vysoká"),
    ("27731", "Byšice"),
    ("27732", "Byšice"),
    ("27735", "Mšeno"),
    ("27801", "Kralupy nad Vltavou"),
    ("28002", "Kolín"),
    ("28401", "Kutná Hora"),
    ("28601", "Čáslav"),
    ("28802", "Nymburk"),
    ("28922", "Lysá nad Labem"),
    ("29301", "Mladá Boleslav"),
    ("29501", "Mnichovo Hradiště"),
    // Západ
    ("30100", "Plzeň"),
    ("30200", "Plzeň"),
    ("30300", "Plzeň"),
    ("30400", "Plzeň"),
    ("31200", "Plzeň"),
    ("31600", "Plzeň"),
    ("32300", "Plzeň"),
    ("32600", "Plzeň"),
    ("33701", "Rokycany"),
    ("34401", "Domažlice"),
    ("34701", "Tachov"),
    ("35002", "Cheb"),
    ("36001", "Karlovy Vary"),
    ("36005", "Karlovy Vary"),
    ("36301", "Ostrov"),
    // Jih
    ("37001", "České Budějovice"),
    ("37004", "České Budějovice"),
    ("37005", "České Budějovice"),
    ("37006", "České Budějovice"),
    ("37701", "Jindřichův Hradec"),
    ("38101", "Český Krumlov"),
    ("38301", "Prachatice"),
    ("38601", "Strakonice"),
    ("39002", "Tábor"),
    ("39701", "Písek"),
    // Sever
    ("40001", "Ústí nad Labem"),
    ("40003", "Ústí nad Labem"),
    ("40502", "Děčín"),
    ("41201", "Litoměřice"),
    ("41501", "Teplice"),
    ("43001", "Chomutov"),
    ("43401", "Most"),
    ("44001", "Louny"),
    ("46001", "Liberec"),
    ("46006", "Liberec"),
    ("46007", "Liberec"),
    ("46601", "Jablonec nad Nisou"),
    ("47001", "Česká Lípa"),
    // Východ
    ("50002", "Hradec Králové"),
    ("50003", "Hradec Králové"),
    ("50008", "Hradec Králové"),
    ("50601", "Jičín"),
    ("51601", "Rychnov nad Kněžnou"),
    ("53002", "Pardubice"),
    ("53003", "Pardubice"),
    ("53009", "Pardubice"),
    ("53701", "Chrudim"),
    ("54101", "Trutnov"),
    ("54701", "Náchod"),
    ("56201", "Ústí nad Orlicí"),
    ("56802", "Svitavy"),
    ("58001", "Havlíčkův Brod"),
    ("58601", "Jihlava"),
    // Brno a jižní Morava
    ("60200", "Brno"),
    ("60300", "Brno"),
    ("61200", "Brno"),
    ("61300", "Brno"),
    ("61400", "Brno"),
    ("61500", "Brno"),
    ("61600", "Brno"),
    ("61700", "Brno"),
    ("61800", "Brno"),
    ("61900", "Brno"),
    ("62100", "Brno"),
    ("62300", "Brno"),
    ("62400", "Brno"),
    ("62500", "Brno"),
    ("62700", "Brno"),
    ("62800", "Brno"),
    ("63500", "Brno"),
    ("63800", "Brno"),
    ("64100", "Brno"),
    ("64200", "Brno"),
    ("64300", "Brno"),
    ("64400", "Brno"),
    ("66401", "Bílovice nad Svitavou"),
    ("66902", "Znojmo"),
    ("67401", "Třebíč"),
    ("67801", "Blansko"),
    ("68201", "Vyškov"),
    ("68601", "Uherské Hradiště"),
    ("69002", "Břeclav"),
    ("69501", "Hodonín"),
    // Ostrava a Slezsko
    ("70030", "Ostrava"),
    ("70200", "Ostrava"),
    ("70300", "Ostrava"),
    ("70800", "Ostrava"),
    ("70900", "Ostrava"),
    ("71000", "Ostrava"),
    ("71200", "Ostrava"),
    ("72000", "Ostrava"),
    ("72100", "Ostrava"),
    ("72200", "Ostrava"),
    ("72300", "Ostrava"),
    ("72400", "Ostrava"),
    ("72500", "Ostrava"),
    ("73301", "Karviná"),
    ("73601", "Havířov"),
    ("73701", "Český Těšín"),
    ("73801", "Frýdek-Místek"),
    ("74101", "Nový Jičín"),
    ("74601", "Opava"),
    ("75002", "Přerov"),
    ("75501", "Vsetín"),
    ("76001", "Zlín"),
    ("76302", "Zlín"),
    ("76701", "Kroměříž"),
    ("77900", "Olomouc"),
    ("78401", "Litovel"),
    ("78701", "Šumperk"),
    ("79201", "Bruntál"),
    ("79601", "Prostějov"),
];

/// Returns the full reference table
pub fn entries() -> &'static [PostalEntry] {
    &POSTAL_TABLE
}
