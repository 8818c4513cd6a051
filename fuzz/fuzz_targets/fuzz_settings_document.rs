#![no_main]

use chrono::NaiveDate;
use hlaseni::core::{Aggregation, ControlSums, ReportingPeriod};
use hlaseni::xml::{DocumentHeader, build_document};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Any settings that parse must produce a document without panicking.
        if let Ok(settings) = hlaseni::filing::parse_settings(s) {
            let _ = hlaseni::core::validate_settings(&settings);
            if let (Ok(period), Some(today)) = (
                ReportingPeriod::new(2025, 1),
                NaiveDate::from_ymd_opt(2025, 2, 25),
            ) {
                let header = DocumentHeader::regular(period, today);
                let _ = build_document(
                    &header,
                    &settings,
                    &Aggregation::default(),
                    &ControlSums::default(),
                );
            }
        }
    }
});
