//! Speakable words for callsigns, numbers, altitudes and directions
//!
//!  Every transform here is pure and yields lowercase tokens suitable for a
//!  text-to-speech engine.

use crate::dispatch::Alert;

/// Label set for compass buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compass {
    /// "northeast"
    Words,
    /// "NE"
    Abbrev,
}

const COMPASS_WORDS: [&str; 8] = [
    "north",
    "northeast",
    "east",
    "southeast",
    "south",
    "southwest",
    "west",
    "northwest",
];

const COMPASS_ABBREV: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Phonetic word for one character, if it has one
fn phonetic_word(c: char) -> Option<&'static str> {
    let word = match c {
        'A' => "alpha",
        'B' => "bravo",
        'C' => "charlie",
        'D' => "delta",
        'E' => "echo",
        'F' => "foxtrot",
        'G' => "golf",
        'H' => "hotel",
        'I' => "india",
        'J' => "juliet",
        'K' => "kilo",
        'L' => "lima",
        'M' => "mike",
        'N' => "november",
        'O' => "oscar",
        'P' => "papa",
        'Q' => "quebec",
        'R' => "romeo",
        'S' => "sierra",
        'T' => "tango",
        'U' => "uniform",
        'V' => "victor",
        'W' => "whiskey",
        'X' => "x-ray",
        'Y' => "yankee",
        'Z' => "zulu",
        '0' => "zero",
        '1' => "one",
        '2' => "two",
        '3' => "three",
        '4' => "four",
        '5' => "five",
        '6' => "six",
        '7' => "seven",
        '8' => "eight",
        '9' => "niner",
        '.' => "point",
        _ => return None,
    };
    Some(word)
}

/// Radio callsign for a three-letter airline designator
fn airline_callsign(icao: &str) -> Option<&'static str> {
    let callsign = match icao {
        "UAL" => "united",
        "FDX" => "fedex",
        "DAL" => "delta",
        "KAP" => "cair",
        "NKS" => "spirit",
        "RPA" => "brickyard",
        "ACA" => "air canada",
        "POE" => "porter",
        "SWA" => "southwest",
        "JBU" => "jet blue",
        "EIN" => "shamrock",
        "AAL" => "american",
        "ASA" => "alaska",
        "FFT" => "frontier flight",
        "JAL" => "japan air",
        "JZA" => "jazz",
        "AFR" => "air france",
        "FPY" => "player",
        "WUP" => "up jet",
        "BAW" => "speed bird",
        "VJA" => "vista am",
        _ => return None,
    };
    Some(callsign)
}

/// Spell `plain` one word per character
pub fn phonetic(plain: &str) -> Vec<String> {
    plain
        .chars()
        .flat_map(char::to_uppercase)
        .map(|c| match phonetic_word(c) {
            Some(word) => word.to_string(),
            None => c.to_string(),
        })
        .collect()
}

/// Callsign followed by the flight number in pairs, e.g. "UAL1234" → united 12 34.
/// Anything not led by a known airline designator is spelled out.
pub fn ident_to_words(ident: &str) -> Vec<String> {
    let Some(prefix) = ident.get(..3) else {
        return phonetic(ident);
    };
    if !prefix.bytes().all(|b| b.is_ascii_uppercase()) {
        return phonetic(ident);
    }
    let Some(callsign) = airline_callsign(prefix) else {
        return phonetic(ident);
    };

    let suffix = &ident[3..];
    let mut words = vec![callsign.to_string()];
    let numeric = suffix.bytes().all(|b| b.is_ascii_digit());

    match suffix.len() {
        2 if numeric => words.push(suffix.to_string()),
        3 if numeric => {
            words.push(suffix[..1].to_string());
            words.push(suffix[1..].to_string());
        }
        4 if numeric => {
            words.push(suffix[..2].to_string());
            words.push(suffix[2..].to_string());
        }
        _ => words.extend(phonetic(suffix)),
    }
    words
}

/// Thousands and hundreds, each omitted when zero
pub fn altitude_to_words(altitude: f64) -> Vec<String> {
    let altitude = altitude as i64;
    let mut words = Vec::new();

    let thousands = altitude / 1000;
    if thousands > 0 {
        words.extend(phonetic(&thousands.to_string()));
        words.push("thousand".to_string());
    }
    let hundreds = (altitude - thousands * 1000) / 100;
    if hundreds > 0 {
        words.extend(phonetic(&hundreds.to_string()));
        words.push("hundred".to_string());
    }
    words
}

/// 8-point compass bucket; each 45° sector includes its upper edge
pub fn cardinal_direction(bearing: f64, labels: Compass) -> &'static str {
    let bearing = bearing.rem_euclid(360.0);
    let index = if bearing > 337.5 || bearing <= 22.5 {
        0
    } else {
        // (22.5, 67.5] → 1, (67.5, 112.5] → 2, ...
        ((bearing - 22.5) / 45.0).ceil() as usize
    };

    match labels {
        Compass::Words => COMPASS_WORDS[index],
        Compass::Abbrev => COMPASS_ABBREV[index],
    }
}

/// Sentence spoken for an approach, e.g.
/// "united 6 41 is one point two nautical miles to the north , at two thousand five hundred , southbound ..."
pub fn announcement(alert: &Alert) -> String {
    let pos = &alert.position;
    let mut words = ident_to_words(&pos.ident);

    words.push("is".to_string());
    words.extend(phonetic(&format!("{:.1}", alert.distance)));
    words.push("nautical miles".to_string());
    words.push("to the".to_string());
    words.push(cardinal_direction(alert.bearing, Compass::Words).to_string());
    words.push(",".to_string());

    if let Some(altitude) = pos.altitude {
        words.push("at".to_string());
        words.extend(altitude_to_words(altitude));
        words.push(",".to_string());
    }
    if let Some(heading) = pos.heading {
        words.push(cardinal_direction(heading, Compass::Words).to_string());
        words.push("bound".to_string());
        words.push(",".to_string());
    }
    if let Some(speed) = pos.ground_speed {
        words.extend(phonetic(&format!("{:.0}", speed)));
        words.push("knots".to_string());
    }

    words.join(" ")
}
