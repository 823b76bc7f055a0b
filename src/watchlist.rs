//! Static ticker registry, grouped by market.
//! Symbols use Yahoo Finance notation (exchange suffixes such as `.DE`, `.T`).

use std::collections::HashSet;

use crate::types::{MarketGroup, WatchlistEntry};

const SP500: &[&str] = &[
    // Technology
    "AAPL", "MSFT", "GOOGL", "AMZN", "META", "NVDA", "TSLA", "AVGO", "ORCL", "CRM",
    "ADBE", "AMD", "INTC", "CSCO", "IBM", "QCOM", "TXN", "NOW", "INTU", "AMAT",
    // Financials
    "BRK-B", "JPM", "V", "MA", "BAC", "WFC", "GS", "MS", "BLK", "SCHW",
    "AXP", "C", "USB", "PNC", "TFC",
    // Healthcare
    "JNJ", "UNH", "PFE", "ABBV", "MRK", "LLY", "TMO", "ABT", "DHR", "BMY",
    "AMGN", "GILD", "ISRG", "VRTX", "REGN", "MDT", "SYK", "ZTS", "CI", "ELV",
    // Consumer
    "PG", "KO", "PEP", "COST", "WMT", "HD", "MCD", "NKE", "SBUX", "TGT",
    "LOW", "TJX", "EL", "CL", "KMB", "GIS", "K", "HSY", "MDLZ", "KHC",
    // Industrials
    "CAT", "DE", "UNP", "RTX", "HON", "BA", "LMT", "GE", "MMM", "UPS",
    "FDX", "EMR", "ITW", "ETN", "PH",
    // Energy
    "XOM", "CVX", "COP", "SLB", "EOG", "PSX", "VLO", "MPC", "OXY", "HAL",
    // Media and telecom
    "DIS", "NFLX", "CMCSA", "WBD", "PARA", "EA", "TTWO", "T", "VZ", "TMUS",
];

const DAX: &[&str] = &[
    "SAP.DE", "SIE.DE", "ALV.DE", "DTE.DE", "MBG.DE", "BMW.DE", "BAS.DE", "MUV2.DE",
    "ADS.DE", "DB1.DE", "VOW3.DE", "IFX.DE", "DHL.DE", "AIR.DE", "SHL.DE", "RWE.DE",
    "BAYN.DE", "HEN3.DE", "CON.DE", "HEI.DE", "FRE.DE", "MTX.DE", "ENR.DE", "SY1.DE",
    "QIA.DE", "MRK.DE", "BEI.DE", "VNA.DE", "1COV.DE", "ZAL.DE", "PAH3.DE", "P911.DE",
    "RHM.DE", "HNR1.DE", "CBK.DE", "DBK.DE",
];

const MDAX: &[&str] = &[
    "AFX.DE", "PUM.DE", "LEG.DE", "EVK.DE", "FME.DE", "TLX.DE", "GXI.DE", "BOSS.DE",
    "RAA.DE", "KGX.DE", "NDA.DE", "WAF.DE", "EVD.DE", "AIXA.DE", "LXS.DE", "TEG.DE",
    "DEQ.DE", "HAG.DE", "G1A.DE", "DUE.DE",
];

const SDAX: &[&str] = &[
    "NEM.DE", "BC8.DE", "FNTN.DE", "JEN.DE", "SFQ.DE", "HHFA.DE", "DHER.DE", "S92.DE",
    "BNR.DE", "SZG.DE",
];

const CAC40: &[&str] = &[
    "MC.PA", "OR.PA", "TTE.PA", "SAN.PA", "AI.PA", "SU.PA", "BN.PA", "KER.PA",
    "RMS.PA", "AIR.PA", "CS.PA", "BNP.PA", "GLE.PA", "CA.PA", "CAP.PA", "EN.PA",
    "RI.PA", "VIV.PA", "ORA.PA", "PUB.PA", "DSY.PA", "STM.PA", "SGO.PA",
];

const FTSE100: &[&str] = &[
    "SHEL.L", "AZN.L", "HSBA.L", "ULVR.L", "BP.L", "GSK.L", "RIO.L", "DGE.L",
    "BATS.L", "REL.L", "LSEG.L", "LLOY.L", "BARC.L", "VOD.L", "NG.L", "RKT.L",
    "PRU.L", "AAL.L", "BT-A.L", "BA.L", "RR.L", "IMB.L", "ANTO.L", "CPG.L",
    "EXPN.L",
];

const AEX: &[&str] = &[
    "ASML.AS", "SHELL.AS", "UNA.AS", "PRX.AS", "HEIA.AS", "INGA.AS", "AD.AS", "DSM.AS",
    "PHIA.AS", "WKL.AS", "ASM.AS", "RAND.AS", "ABN.AS", "KPN.AS", "AKZA.AS",
];

const SMI: &[&str] = &[
    "NESN.SW", "NOVN.SW", "ROG.SW", "UBSG.SW", "CSGN.SW", "ABBN.SW", "ZURN.SW", "SREN.SW",
    "LONN.SW", "GIVN.SW", "SIKA.SW", "CFR.SW", "GEBN.SW", "SLHN.SW", "SCMN.SW",
];

const JAPAN: &[&str] = &[
    "7203.T", "6758.T", "9984.T", "6861.T", "8306.T", "6501.T", "7267.T", "4502.T",
    "9433.T", "6902.T", "6098.T", "4063.T", "8035.T", "6367.T", "6954.T", "7741.T",
    "4519.T", "6273.T", "7751.T", "4661.T", "9432.T", "6594.T", "8001.T", "8058.T",
    "8031.T", "6981.T", "7974.T", "6762.T", "4543.T", "6971.T",
];

const KOREA: &[&str] = &[
    "005930.KS", "000660.KS", "207940.KS", "005380.KS", "051910.KS", "006400.KS",
    "035420.KS", "035720.KS", "068270.KS", "003670.KS", "105560.KS", "055550.KS",
    "012330.KS", "028260.KS", "000270.KS",
];

const CHINA: &[&str] = &[
    // US-listed ADRs
    "BABA", "JD", "PDD", "BIDU", "NIO", "XPEV", "LI", "NTES", "TME", "BILI",
    "TAL", "ZTO", "YUMC", "MNSO", "FUTU",
    // Hong Kong
    "0700.HK", "9988.HK", "3690.HK", "1211.HK", "2318.HK", "0941.HK", "1398.HK", "3988.HK",
    "0939.HK", "2628.HK", "0883.HK", "1810.HK", "9618.HK", "9999.HK", "2020.HK", "9888.HK",
    "1024.HK", "0388.HK", "0005.HK", "0011.HK",
];

const AUSTRALIA: &[&str] = &[
    "BHP.AX", "CBA.AX", "CSL.AX", "NAB.AX", "WBC.AX", "ANZ.AX", "WES.AX", "MQG.AX",
    "WDS.AX", "TLS.AX", "RIO.AX", "FMG.AX", "WOW.AX", "ALL.AX", "TCL.AX",
];

const INDIA: &[&str] = &["INFY", "WIT", "HDB", "IBN", "SIFY", "TTM", "RDY", "VEDL", "WNS"];

const NORDIC: &[&str] = &[
    "ERIC-B.ST", "VOLV-B.ST", "ATCO-B.ST", "INVE-B.ST", "SEB-A.ST", "SAND.ST", "HM-B.ST",
    "ABB.ST", "SWED-A.ST", "ALFA.ST",
    "NOVO-B.CO", "MAERSK-B.CO", "DSV.CO", "CARL-B.CO", "VWS.CO", "ORSTED.CO", "COLO-B.CO",
    "DEMANT.CO",
    "EQNR.OL", "DNB.OL", "TEL.OL", "MOWI.OL", "YAR.OL",
    "NOKIA.HE", "FORTUM.HE", "NESTE.HE", "UPM.HE", "STERV.HE",
];

const SOUTHERN_EUROPE: &[&str] = &[
    "SAN.MC", "BBVA.MC", "ITX.MC", "IBE.MC", "TEF.MC", "REP.MC", "CABK.MC", "FER.MC",
    "ENI.MI", "ENEL.MI", "ISP.MI", "UCG.MI", "G.MI", "STM.MI", "RACE.MI", "LUX.MI",
];

const CANADA: &[&str] = &[
    "RY.TO", "TD.TO", "BNS.TO", "ENB.TO", "CNR.TO", "CP.TO", "BMO.TO", "SU.TO",
    "TRP.TO", "BCE.TO", "CNQ.TO", "SHOP.TO", "MFC.TO", "ATD.TO", "NTR.TO",
];

const GROUPS: &[(MarketGroup, &[&str])] = &[
    (MarketGroup::Sp500, SP500),
    (MarketGroup::Dax, DAX),
    (MarketGroup::Mdax, MDAX),
    (MarketGroup::Sdax, SDAX),
    (MarketGroup::Cac40, CAC40),
    (MarketGroup::Ftse100, FTSE100),
    (MarketGroup::Aex, AEX),
    (MarketGroup::Smi, SMI),
    (MarketGroup::Japan, JAPAN),
    (MarketGroup::Korea, KOREA),
    (MarketGroup::China, CHINA),
    (MarketGroup::Australia, AUSTRALIA),
    (MarketGroup::India, INDIA),
    (MarketGroup::Nordic, NORDIC),
    (MarketGroup::SouthernEurope, SOUTHERN_EUROPE),
    (MarketGroup::Canada, CANADA),
];

/// Full watchlist in group order. A symbol listed twice keeps its first group.
pub fn registry() -> Vec<WatchlistEntry> {
    let mut seen = HashSet::new();
    GROUPS
        .iter()
        .flat_map(|(market, symbols)| symbols.iter().map(move |s| (*market, *s)))
        .filter(|(_, symbol)| seen.insert(*symbol))
        .map(|(market, symbol)| WatchlistEntry { symbol: symbol.to_string(), market })
        .collect()
}

/// Market group for a symbol, if the registry knows it.
pub fn market_of(symbol: &str) -> Option<MarketGroup> {
    GROUPS
        .iter()
        .find(|(_, symbols)| symbols.contains(&symbol))
        .map(|(market, _)| *market)
}

/// Watchlist from an explicit symbol list, deduplicated in input order.
/// Unknown symbols are kept under `MarketGroup::Custom`.
pub fn from_symbols(symbols: &[String]) -> Vec<WatchlistEntry> {
    let mut seen = HashSet::new();
    symbols
        .iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .map(|symbol| {
            let market = market_of(&symbol).unwrap_or(MarketGroup::Custom);
            WatchlistEntry { symbol, market }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_no_duplicates() {
        let list = registry();
        let unique: HashSet<_> = list.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(unique.len(), list.len());
        assert!(list.len() > 300, "registry unexpectedly small: {}", list.len());
    }

    #[test]
    fn registry_preserves_group_order() {
        let list = registry();
        assert_eq!(list.first().map(|e| e.symbol.as_str()), Some("AAPL"));
        assert_eq!(list.first().map(|e| e.market), Some(MarketGroup::Sp500));
        assert_eq!(list.last().map(|e| e.market), Some(MarketGroup::Canada));
    }

    #[test]
    fn same_root_on_different_exchanges_is_distinct() {
        assert_eq!(market_of("AIR.DE"), Some(MarketGroup::Dax));
        assert_eq!(market_of("AIR.PA"), Some(MarketGroup::Cac40));
        assert_eq!(market_of("STM.MI"), Some(MarketGroup::SouthernEurope));
    }

    #[test]
    fn explicit_list_dedups_and_tags_unknowns() {
        let input: Vec<String> = ["msft", "SAP.DE", "MSFT", " ", "XYZ1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let list = from_symbols(&input);
        let symbols: Vec<_> = list.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["MSFT", "SAP.DE", "XYZ1"]);
        assert_eq!(list[0].market, MarketGroup::Sp500);
        assert_eq!(list[1].market, MarketGroup::Dax);
        assert_eq!(list[2].market, MarketGroup::Custom);
    }
}
