//! SQL schema for the tcgsync SQLite store.
//!
//! Executed at every connection startup. The schema is created, never
//! migrated.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS sets (
    id            TEXT PRIMARY KEY,
    code          TEXT NOT NULL,
    name          TEXT NOT NULL,
    series        TEXT NOT NULL,   -- Series discriminant, e.g. 'SWORD_AND_SHIELD'
    release_date  TEXT NOT NULL,   -- YYYY-MM-DD
    last_updated  TEXT NOT NULL,   -- YYYY-MM-DD HH:MM:SS
    printed_total INTEGER NOT NULL,
    total         INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS set_legalities (
    set_id   TEXT NOT NULL REFERENCES sets(id),
    format   TEXT NOT NULL,        -- upper-cased, e.g. 'STANDARD'
    legality TEXT NOT NULL,
    PRIMARY KEY (set_id, format)
);

CREATE TABLE IF NOT EXISTS set_images (
    set_id     TEXT NOT NULL REFERENCES sets(id),
    image_type TEXT NOT NULL,
    url        TEXT NOT NULL,
    PRIMARY KEY (set_id, image_type)
);

-- Cards are updated in place, never deleted.
CREATE TABLE IF NOT EXISTS cards (
    id          INTEGER PRIMARY KEY,
    external_id TEXT NOT NULL,
    set_id      TEXT NOT NULL REFERENCES sets(id),
    set_number  TEXT,              -- canonical 'number/printed_total'
    name        TEXT NOT NULL,
    rarity      TEXT,
    illustrator TEXT,
    supertype   TEXT,
    UNIQUE (external_id, set_id)
);

-- Creature cards only; at most one per card.
CREATE TABLE IF NOT EXISTS card_pokemon_details (
    id                  INTEGER PRIMARY KEY,
    card_id             INTEGER NOT NULL UNIQUE REFERENCES cards(id),
    hit_points          INTEGER,
    retreat_cost        INTEGER NOT NULL DEFAULT 0,
    flavor_text         TEXT,
    weakness_type       TEXT,
    weakness_modifier   TEXT,
    weakness_value      INTEGER,
    resistance_type     TEXT,
    resistance_modifier TEXT,
    resistance_value    INTEGER
);

CREATE TABLE IF NOT EXISTS card_attacks (
    id         INTEGER PRIMARY KEY,
    details_id INTEGER NOT NULL REFERENCES card_pokemon_details(id),
    name       TEXT NOT NULL,
    damage     TEXT,
    text       TEXT,
    UNIQUE (details_id, name)
);

-- A multiset: repeated symbols are told apart by their ordinal.
CREATE TABLE IF NOT EXISTS card_attack_costs (
    id        INTEGER PRIMARY KEY,
    attack_id INTEGER NOT NULL REFERENCES card_attacks(id),
    cost      TEXT NOT NULL,
    ordinal   INTEGER NOT NULL,
    UNIQUE (attack_id, cost, ordinal)
);

CREATE TABLE IF NOT EXISTS card_abilities (
    id         INTEGER PRIMARY KEY,
    details_id INTEGER NOT NULL REFERENCES card_pokemon_details(id),
    name       TEXT NOT NULL,
    text       TEXT,
    type       TEXT,
    UNIQUE (details_id, name)
);

CREATE TABLE IF NOT EXISTS card_types (
    details_id INTEGER NOT NULL REFERENCES card_pokemon_details(id),
    type       TEXT NOT NULL,
    PRIMARY KEY (details_id, type)
);

CREATE TABLE IF NOT EXISTS card_subtypes (
    card_id INTEGER NOT NULL REFERENCES cards(id),
    subtype TEXT NOT NULL,
    PRIMARY KEY (card_id, subtype)
);

-- Non-creature cards only.
CREATE TABLE IF NOT EXISTS card_rules (
    card_id INTEGER NOT NULL REFERENCES cards(id),
    rule    TEXT NOT NULL,
    PRIMARY KEY (card_id, rule)
);

CREATE TABLE IF NOT EXISTS card_images (
    card_id    INTEGER NOT NULL REFERENCES cards(id),
    resolution TEXT NOT NULL,
    url        TEXT NOT NULL,
    PRIMARY KEY (card_id, resolution)
);

-- One current row per (card, finish, condition), overwritten in place.
CREATE TABLE IF NOT EXISTS card_price (
    id         INTEGER PRIMARY KEY,
    card_id    INTEGER NOT NULL REFERENCES cards(id),
    finish     TEXT NOT NULL,
    condition  TEXT NOT NULL,
    price      REAL,
    updated_at TEXT NOT NULL,      -- RFC 3339 UTC
    UNIQUE (card_id, finish, condition)
);

-- Append-only. No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS card_price_history (
    id        INTEGER PRIMARY KEY,
    card_id   INTEGER NOT NULL REFERENCES cards(id),
    finish    TEXT NOT NULL,
    condition TEXT NOT NULL,
    price     REAL NOT NULL,
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS cards_external_idx      ON cards(external_id);
CREATE INDEX IF NOT EXISTS attacks_details_idx     ON card_attacks(details_id);
CREATE INDEX IF NOT EXISTS costs_attack_idx        ON card_attack_costs(attack_id);
CREATE INDEX IF NOT EXISTS abilities_details_idx   ON card_abilities(details_id);
CREATE INDEX IF NOT EXISTS price_history_card_idx  ON card_price_history(card_id);
";
