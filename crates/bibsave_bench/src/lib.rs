//! Benchmark utilities.

use bibsave_core::{Database, DatabaseContext, Record, RecordId, StringMacro};
use rand::seq::SliceRandom;
use rand::Rng;

const TYPES: [&str; 4] = ["article", "book", "inproceedings", "misc"];
const SURNAMES: [&str; 6] = ["Knuth", "Lamport", "Dijkstra", "Hoare", "Liskov", "Milner"];
const WORDS: [&str; 8] = ["on", "the", "semantics", "of", "concurrent", "programs", "proof", "types"];

/// Generate a random title of `words` words.
pub fn random_title(rng: &mut impl Rng, words: usize) -> String {
    (0..words)
        .filter_map(|_| WORDS.choose(rng).copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generate a database of `count` records.
///
/// About one record in ten cross-references an earlier one, and one in
/// four uses the `#pub#` string.
pub fn random_database(count: usize) -> DatabaseContext {
    let mut rng = rand::thread_rng();
    let mut db = Database::new();
    db.insert_string(StringMacro::new("pub", "Addison-Wesley"));

    for i in 0..count {
        let entry_type = TYPES.choose(&mut rng).copied().unwrap_or("misc");
        let author = SURNAMES.choose(&mut rng).copied().unwrap_or("Anon");
        let mut record = Record::new(RecordId::new(i as u64 + 1), entry_type)
            .with_key(format!("{}{}", author.to_lowercase(), i))
            .with_field("author", format!("{author}, A."))
            .with_field("title", random_title(&mut rng, 6))
            .with_field("year", rng.gen_range(1960..2025).to_string());
        if i > 0 && rng.gen_ratio(1, 10) {
            let target = rng.gen_range(0..i);
            let key = db.records()[target].key().unwrap_or_default().to_string();
            record.set_field("crossref", key);
        }
        if rng.gen_ratio(1, 4) {
            record.set_field("publisher", "#pub#");
        }
        db.insert_record(record);
    }
    DatabaseContext::new(db)
}

/// Alphabetic macro name for `i`: `a`, `b`, ..., `z`, `ba`, ...
pub fn macro_name(mut i: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'a' + (i % 26) as u8);
        i /= 26;
        if i == 0 {
            break;
        }
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Generate `count` string definitions, each referencing the next.
///
/// Alphabetical order is the reverse of dependency order, so every
/// definition goes through reference resolution.
pub fn string_chain(count: usize) -> DatabaseContext {
    let mut db = Database::new();
    for i in 0..count {
        let content = if i + 1 < count {
            format!("#{}# tail", macro_name(i + 1))
        } else {
            "end".to_string()
        };
        db.insert_string(StringMacro::new(macro_name(i), content));
    }
    DatabaseContext::new(db)
}
