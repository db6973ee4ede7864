use super::structs::WireMode;
use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    static ref HISTORIC_TAGS: HashMap<&'static str, &'static str> = get_historic_tags();
    static ref STANDARD_TAGS: HashMap<&'static str, &'static str> = get_standard_tags();
}

pub fn describe_tag(mode: WireMode, tag: &str) -> Option<&'static str> {
    match mode {
        WireMode::Historic => HISTORIC_TAGS.get(tag).copied(),
        WireMode::Standard => STANDARD_TAGS.get(tag).copied(),
    }
}

fn get_historic_tags() -> HashMap<&'static str, &'static str> {
    let mut map = HashMap::new();

    // Identification and contract
    map.insert("ADCO", "Meter address");
    map.insert("OPTARIF", "Tariff option");
    map.insert("ISOUSC", "Subscribed current");
    map.insert("PTEC", "Current tariff period");
    map.insert("DEMAIN", "Tomorrow's colour (Tempo)");
    map.insert("HHPHC", "Peak/off-peak hours schedule");
    map.insert("MOTDETAT", "Meter status word");
    map.insert("PEJP", "EJP notice");

    // Index
    map.insert("BASE", "Index, base option");
    map.insert("HCHC", "Index, off-peak hours");
    map.insert("HCHP", "Index, peak hours");
    map.insert("EJPHN", "Index, EJP normal hours");
    map.insert("EJPHPM", "Index, EJP mobile peak hours");
    map.insert("BBRHCJB", "Index, Tempo blue days off-peak");
    map.insert("BBRHPJB", "Index, Tempo blue days peak");
    map.insert("BBRHCJW", "Index, Tempo white days off-peak");
    map.insert("BBRHPJW", "Index, Tempo white days peak");
    map.insert("BBRHCJR", "Index, Tempo red days off-peak");
    map.insert("BBRHPJR", "Index, Tempo red days peak");

    // Instantaneous values
    map.insert("IINST", "Instantaneous current");
    map.insert("IINST1", "Instantaneous current (L1)");
    map.insert("IINST2", "Instantaneous current (L2)");
    map.insert("IINST3", "Instantaneous current (L3)");
    map.insert("IMAX", "Maximum current");
    map.insert("IMAX1", "Maximum current (L1)");
    map.insert("IMAX2", "Maximum current (L2)");
    map.insert("IMAX3", "Maximum current (L3)");
    map.insert("PMAX", "Maximum three-phase power");
    map.insert("PAPP", "Apparent power");
    map.insert("ADPS", "Subscribed power exceeded warning");
    map.insert("PPOT", "Potentials presence");

    map
}

fn get_standard_tags() -> HashMap<&'static str, &'static str> {
    let mut map = HashMap::new();

    // Identification and contract
    map.insert("ADSC", "Secondary meter address");
    map.insert("VTIC", "TIC version");
    map.insert("DATE", "Current date and time");
    map.insert("NGTF", "Supplier tariff name");
    map.insert("LTARF", "Current tariff label");
    map.insert("PREF", "Reference apparent power");
    map.insert("PCOUP", "Cut-off apparent power");
    map.insert("PRM", "Delivery point reference");
    map.insert("RELAIS", "Relays");
    map.insert("NTARF", "Current tariff index");
    map.insert("NJOURF", "Current provider day number");
    map.insert("NJOURF+1", "Next provider day number");
    map.insert("PJOURF+1", "Next day profile");
    map.insert("PPOINTE", "Next peak day profile");
    map.insert("STGE", "Status register");
    map.insert("MSG1", "Short message");
    map.insert("MSG2", "Ultra short message");
    map.insert("DPM1", "Start of mobile peak 1");
    map.insert("FPM1", "End of mobile peak 1");

    // Index
    map.insert("EAST", "Total active energy withdrawn");
    map.insert("EASF01", "Active energy withdrawn, supplier index 1");
    map.insert("EASF02", "Active energy withdrawn, supplier index 2");
    map.insert("EASF03", "Active energy withdrawn, supplier index 3");
    map.insert("EASF04", "Active energy withdrawn, supplier index 4");
    map.insert("EASD01", "Active energy withdrawn, distributor index 1");
    map.insert("EASD02", "Active energy withdrawn, distributor index 2");
    map.insert("EAIT", "Total active energy injected");
    map.insert("ERQ1", "Total reactive energy Q1");
    map.insert("ERQ2", "Total reactive energy Q2");
    map.insert("ERQ3", "Total reactive energy Q3");
    map.insert("ERQ4", "Total reactive energy Q4");

    // Instantaneous values
    map.insert("IRMS1", "RMS current (L1)");
    map.insert("IRMS2", "RMS current (L2)");
    map.insert("IRMS3", "RMS current (L3)");
    map.insert("URMS1", "RMS voltage (L1)");
    map.insert("URMS2", "RMS voltage (L2)");
    map.insert("URMS3", "RMS voltage (L3)");
    map.insert("UMOY1", "Average voltage (L1)");
    map.insert("SINSTS", "Apparent power withdrawn");
    map.insert("SINSTS1", "Apparent power withdrawn (L1)");
    map.insert("SINSTI", "Apparent power injected");
    map.insert("SMAXSN", "Maximum apparent power withdrawn today");
    map.insert("SMAXSN-1", "Maximum apparent power withdrawn yesterday");
    map.insert("SMAXIN", "Maximum apparent power injected today");
    map.insert("CCASN", "Active load curve point withdrawn");
    map.insert("CCASN-1", "Previous active load curve point withdrawn");

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_tag() {
        assert_eq!(describe_tag(WireMode::Historic, "PAPP"), Some("Apparent power"));
        assert_eq!(describe_tag(WireMode::Standard, "ADSC"), Some("Secondary meter address"));
        assert_eq!(describe_tag(WireMode::Standard, "nonexistent"), None);
    }

    #[test]
    fn test_tags_are_mode_specific() {
        assert!(describe_tag(WireMode::Historic, "ADCO").is_some());
        assert!(describe_tag(WireMode::Standard, "ADCO").is_none());
        assert!(describe_tag(WireMode::Historic, "SINSTS").is_none());
    }
}
