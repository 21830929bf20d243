//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone as _, Utc};
use tcgsync_core::{
  card::{Ability, Attack, CardRecord, Modifier, NO_COST, PokemonDetails},
  era::Series,
  price::{Condition, Finish, PriceObservation, PriceOutcome},
  set::SetRecord,
  store::CatalogStore,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn set(id: &str, series: Series, released: (i32, u32, u32), printed_total: u32) -> SetRecord {
  let (y, m, d) = released;
  let release_date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
  SetRecord {
    id: id.into(),
    code: id.to_uppercase(),
    name: format!("Set {id}"),
    series,
    release_date,
    last_updated: release_date.and_hms_opt(12, 0, 0).unwrap(),
    printed_total,
    total: printed_total + 10,
    legalities: BTreeMap::from([("UNLIMITED".into(), "Legal".into())]),
    images: BTreeMap::from([("symbol".into(), format!("https://img/{id}/symbol.png"))]),
  }
}

fn catalog() -> Vec<SetRecord> {
  vec![
    set("base1", Series::Base, (1999, 1, 9), 102),
    set("swshp", Series::SwordAndShield, (2019, 11, 15), 307),
    set("swsh1", Series::SwordAndShield, (2020, 2, 7), 202),
    set("sv1", Series::ScarletAndViolet, (2023, 3, 31), 198),
  ]
}

fn attack(name: &str, cost: &[&str]) -> Attack {
  Attack {
    name:   name.into(),
    damage: Some("30".into()),
    text:   None,
    cost:   if cost.is_empty() {
      vec![NO_COST.into()]
    } else {
      cost.iter().map(|c| c.to_string()).collect()
    },
  }
}

fn creature(external_id: &str, number: &str) -> CardRecord {
  CardRecord {
    external_id: external_id.into(),
    name:        "Scorbunny".into(),
    number:      number.into(),
    rarity:      Some("Common".into()),
    illustrator: Some("Akira Komayama".into()),
    supertype:   Some("Pokémon".into()),
    details:     Some(PokemonDetails {
      hit_points:   Some(60),
      retreat_cost: 1,
      flavor_text:  Some("Runs around.".into()),
      weakness:     Some(Modifier {
        kind:     Some("Water".into()),
        modifier: Some('×'),
        value:    Some(2),
      }),
      resistance:   None,
    }),
    attacks:     vec![attack("Quick Attack", &[]), attack("Flare", &["Fire", "Colorless"])],
    abilities:   vec![],
    types:       vec!["Fire".into()],
    subtypes:    vec!["Basic".into()],
    rules:       vec![],
    images:      BTreeMap::from([
      ("small".into(), "https://img/s.png".into()),
      ("large".into(), "https://img/l.png".into()),
    ]),
  }
}

fn trainer(external_id: &str, number: &str) -> CardRecord {
  CardRecord {
    external_id: external_id.into(),
    name:        "Professor's Research".into(),
    number:      number.into(),
    rarity:      Some("Rare".into()),
    illustrator: None,
    supertype:   Some("Trainer".into()),
    details:     None,
    attacks:     vec![],
    abilities:   vec![],
    types:       vec![],
    subtypes:    vec!["Supporter".into()],
    rules:       vec!["Discard your hand and draw 7 cards.".into()],
    images:      BTreeMap::new(),
  }
}

async fn seeded() -> SqliteStore {
  let s = store().await;
  s.import_sets(catalog()).await.unwrap();
  s
}

async fn stored_id(s: &SqliteStore, external_id: &str) -> i64 {
  s.card_id(external_id.into()).await.unwrap().expect("card stored")
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> { Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap() }

// ─── Sets ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn set_import_is_idempotent() {
  let s = store().await;

  let first = s.import_sets(catalog()).await.unwrap();
  // 4 set rows, 4 legalities, 4 images.
  assert_eq!(first.inserted, 12);
  assert_eq!(first.writes(), 12);

  let second = s.import_sets(catalog()).await.unwrap();
  assert!(second.is_noop(), "second import wrote: {second}");

  assert_eq!(s.set_ids().await.unwrap(), vec!["base1", "sv1", "swsh1", "swshp"]);
}

#[tokio::test]
async fn set_changes_are_reconciled() {
  let s = seeded().await;

  let mut sets = catalog();
  sets[0].name = "Base Set".into();
  sets[0].legalities.insert("EXPANDED".into(), "Banned".into());
  sets[0].images.clear();

  let report = s.import_sets(sets).await.unwrap();
  assert_eq!(report.updated, 1);
  assert_eq!(report.inserted, 1);
  assert_eq!(report.deleted, 1);
}

#[tokio::test]
async fn numbering_follows_the_set_era() {
  let s = seeded().await;

  let base = s.set_numbering("base1".into()).await.unwrap().unwrap();
  assert_eq!(base.printed_total, 102);
  assert!(!base.fixed_padding);

  assert!(s.set_numbering("swsh1".into()).await.unwrap().unwrap().fixed_padding);
  assert!(s.set_numbering("sv1".into()).await.unwrap().unwrap().fixed_padding);
  // Released before the reference set.
  assert!(!s.set_numbering("swshp".into()).await.unwrap().unwrap().fixed_padding);

  assert!(s.set_numbering("nope".into()).await.unwrap().is_none());
}

// ─── Cards ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn creature_import_end_to_end() {
  let s = seeded().await;

  let first = s
    .import_cards("swsh1".into(), vec![creature("swsh1-32", "32")])
    .await
    .unwrap();
  // card, details, 2 attacks, 3 costs, 1 type, 1 subtype, 2 images.
  assert_eq!(first.inserted, 11);
  assert_eq!(first.updated, 0);
  assert_eq!(first.deleted, 0);

  let id = stored_id(&s, "swsh1-32").await;
  let card = s.load_card(id).await.unwrap().unwrap();
  assert_eq!(card.set_id, "swsh1");
  assert_eq!(card.row.set_number.as_deref(), Some("032/202"));
  assert_eq!(card.attacks.len(), 2);
  assert_eq!(card.attacks[0].cost, vec![NO_COST]);
  assert_eq!(card.attacks[1].cost, vec!["Fire", "Colorless"]);
  assert_eq!(card.details.as_ref().unwrap().weakness.as_ref().unwrap().modifier, Some('×'));
  assert_eq!(card.types, vec!["Fire"]);
  assert_eq!(card.images.len(), 2);

  let second = s
    .import_cards("swsh1".into(), vec![creature("swsh1-32", "32")])
    .await
    .unwrap();
  assert!(second.is_noop(), "re-import wrote: {second}");
  assert_eq!(s.load_card(id).await.unwrap().unwrap(), card);
}

#[tokio::test]
async fn changed_card_converges() {
  let s = seeded().await;
  s.import_cards("swsh1".into(), vec![creature("swsh1-32", "32")])
    .await
    .unwrap();

  let mut changed = creature("swsh1-32", "32");
  changed.name = "Scorbunny V".into();
  changed.attacks = vec![
    attack("Flare", &["Fire", "Fire", "Colorless"]),
    attack("Double Kick", &["Colorless"]),
  ];
  changed.abilities = vec![Ability {
    name: "Libero".into(),
    text: Some("Changes type.".into()),
    kind: Some("Ability".into()),
  }];
  changed.images.remove("large");
  changed.images.insert("small".into(), "https://img/s2.png".into());

  let report = s
    .import_cards("swsh1".into(), vec![changed.clone()])
    .await
    .unwrap();
  assert!(!report.is_noop());

  let id = stored_id(&s, "swsh1-32").await;
  let card = s.load_card(id).await.unwrap().unwrap();
  assert_eq!(card.row.name, "Scorbunny V");
  let mut names: Vec<_> = card.attacks.iter().map(|a| a.name.as_str()).collect();
  names.sort_unstable();
  assert_eq!(names, vec!["Double Kick", "Flare"]);
  let flare = card.attacks.iter().find(|a| a.name == "Flare").unwrap();
  let mut cost = flare.cost.clone();
  cost.sort_unstable();
  assert_eq!(cost, vec!["Colorless", "Fire", "Fire"]);
  assert_eq!(card.abilities, changed.abilities);
  assert_eq!(
    card.images,
    BTreeMap::from([("small".to_string(), "https://img/s2.png".to_string())])
  );

  let again = s.import_cards("swsh1".into(), vec![changed]).await.unwrap();
  assert!(again.is_noop(), "third import wrote: {again}");
}

#[tokio::test]
async fn shrinking_a_repeated_cost_deletes_one_slot() {
  let s = seeded().await;
  let mut card = creature("swsh1-1", "1");
  card.attacks = vec![attack("Blaze", &["Fire", "Fire", "Colorless"])];
  s.import_cards("swsh1".into(), vec![card.clone()]).await.unwrap();

  card.attacks = vec![attack("Blaze", &["Fire", "Colorless"])];
  let report = s.import_cards("swsh1".into(), vec![card]).await.unwrap();
  assert_eq!(report, tcgsync_core::reconcile::ReconcileReport {
    inserted: 0,
    updated:  0,
    deleted:  1,
  });
}

#[tokio::test]
async fn leaving_creature_supertype_drops_details() {
  let s = seeded().await;
  s.import_cards("swsh1".into(), vec![creature("swsh1-32", "32")])
    .await
    .unwrap();

  let mut energy = trainer("swsh1-32", "32");
  energy.supertype = Some("Energy".into());
  energy.rules = vec![];
  energy.subtypes = vec!["Basic".into()];
  let report = s.import_cards("swsh1".into(), vec![energy]).await.unwrap();
  // details, 2 attacks, 3 costs, 1 type, 2 images.
  assert_eq!(report.deleted, 9);

  let id = stored_id(&s, "swsh1-32").await;
  let card = s.load_card(id).await.unwrap().unwrap();
  assert!(card.details.is_none());
  assert!(card.attacks.is_empty());
  assert!(card.types.is_empty());
  assert_eq!(card.row.supertype.as_deref(), Some("Energy"));
}

#[tokio::test]
async fn trainer_keeps_rules_and_legacy_numbering() {
  let s = seeded().await;
  s.import_cards("base1".into(), vec![trainer("base1-88", "088")])
    .await
    .unwrap();

  let id = stored_id(&s, "base1-88").await;
  let card = s.load_card(id).await.unwrap().unwrap();
  assert_eq!(card.row.set_number.as_deref(), Some("88/102"));
  assert_eq!(card.rules, vec!["Discard your hand and draw 7 cards."]);
  assert!(card.details.is_none());
}

#[tokio::test]
async fn blank_number_is_stored_null() {
  let s = seeded().await;
  s.import_cards("sv1".into(), vec![trainer("sv1-x", "")])
    .await
    .unwrap();
  let id = stored_id(&s, "sv1-x").await;
  assert_eq!(s.load_card(id).await.unwrap().unwrap().row.set_number, None);
}

#[tokio::test]
async fn unknown_set_aborts_the_file() {
  let s = seeded().await;
  let err = s
    .import_cards("xy99".into(), vec![creature("xy99-1", "1")])
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UnknownSet(ref id) if id == "xy99"), "{err}");
  assert!(s.card_id("xy99-1".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn bad_card_rolls_back_the_whole_file() {
  let s = seeded().await;
  let err = s
    .import_cards("swsh1".into(), vec![creature("swsh1-1", "1"), trainer("swsh1-2", "??")])
    .await
    .unwrap_err();
  assert!(
    matches!(err, Error::Core(tcgsync_core::Error::InvalidNumber { .. })),
    "{err}"
  );
  assert!(s.card_id("swsh1-1".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn same_external_id_in_two_sets_is_two_cards() {
  let s = seeded().await;
  s.import_cards("swsh1".into(), vec![creature("promo-1", "1")])
    .await
    .unwrap();
  let report = s
    .import_cards("sv1".into(), vec![creature("promo-1", "1")])
    .await
    .unwrap();
  assert_eq!(report.inserted, 11);
}

// ─── Prices ──────────────────────────────────────────────────────────────────

async fn priced_card(s: &SqliteStore) -> i64 {
  s.import_cards("swsh1".into(), vec![creature("swsh1-32", "32")])
    .await
    .unwrap();
  stored_id(s, "swsh1-32").await
}

#[tokio::test]
async fn identical_observation_is_idempotent() {
  let s = seeded().await;
  let id = priced_card(&s).await;

  for _ in 0..2 {
    s.record_price(id, Finish::Normal, Condition::NearMint, Some(0.25), at(2024, 5, 1))
      .await
      .unwrap();
  }
  assert!(s.price_history(id).await.unwrap().is_empty());

  s.record_price(id, Finish::Normal, Condition::NearMint, Some(0.30), at(2024, 5, 2))
    .await
    .unwrap();
  s.record_price(id, Finish::Normal, Condition::NearMint, Some(0.30), at(2024, 5, 2))
    .await
    .unwrap();
  assert_eq!(s.price_history(id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn newer_observation_archives_the_previous_value() {
  let s = seeded().await;
  let id = priced_card(&s).await;

  let first = s
    .record_price(id, Finish::Holofoil, Condition::NearMint, Some(1.5), at(2024, 5, 1))
    .await
    .unwrap();
  assert_eq!(first, PriceOutcome::Recorded { variants: 1, archived: 0 });
  let second = s
    .record_price(id, Finish::Holofoil, Condition::NearMint, Some(2.0), at(2024, 5, 2))
    .await
    .unwrap();
  assert_eq!(second, PriceOutcome::Recorded { variants: 1, archived: 1 });

  let history = s.price_history(id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].price, 1.5);
  assert_eq!(history[0].timestamp, at(2024, 5, 1));
  assert_eq!(history[0].finish, Finish::Holofoil);

  let current = s.current_prices(id).await.unwrap();
  assert_eq!(current.len(), 1);
  assert_eq!(current[0].price, Some(2.0));
  assert_eq!(current[0].updated_at, at(2024, 5, 2));
}

#[tokio::test]
async fn null_previous_price_is_not_archived() {
  let s = seeded().await;
  let id = priced_card(&s).await;

  s.record_price(id, Finish::Normal, Condition::NearMint, None, at(2024, 5, 1))
    .await
    .unwrap();
  let archived = s
    .record_price(id, Finish::Normal, Condition::NearMint, Some(3.0), at(2024, 5, 2))
    .await
    .unwrap();
  assert_eq!(archived, PriceOutcome::Recorded { variants: 1, archived: 0 });
  assert!(s.price_history(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn card_prices_are_recorded_per_variant() {
  let s = seeded().await;
  let id = priced_card(&s).await;

  let observations = vec![
    PriceObservation {
      finish:      Finish::Normal,
      condition:   Condition::NearMint,
      price:       Some(0.1),
      observed_at: at(2024, 5, 1),
    },
    PriceObservation {
      finish:      Finish::ReverseHolo,
      condition:   Condition::NearMint,
      price:       Some(0.4),
      observed_at: at(2024, 5, 1),
    },
  ];

  let outcome = s
    .record_card_prices("swsh1-32".into(), observations.clone())
    .await
    .unwrap();
  assert_eq!(outcome, PriceOutcome::Recorded { variants: 2, archived: 0 });
  assert_eq!(s.current_prices(id).await.unwrap().len(), 2);

  let later: Vec<_> = observations
    .into_iter()
    .map(|o| PriceObservation { observed_at: at(2024, 5, 2), ..o })
    .collect();
  let outcome = s.record_card_prices("swsh1-32".into(), later).await.unwrap();
  assert_eq!(outcome, PriceOutcome::Recorded { variants: 2, archived: 2 });
}

#[tokio::test]
async fn unknown_card_prices_write_nothing() {
  let s = seeded().await;
  let outcome = s
    .record_card_prices("nobody-1".into(), vec![PriceObservation {
      finish:      Finish::Normal,
      condition:   Condition::NearMint,
      price:       Some(1.0),
      observed_at: at(2024, 5, 1),
    }])
    .await
    .unwrap();
  assert_eq!(outcome, PriceOutcome::UnknownCard);
}

#[tokio::test]
async fn unknown_card_id_price_writes_nothing() {
  let s = seeded().await;
  let id = priced_card(&s).await;

  let outcome = s
    .record_price(id + 1_000, Finish::Normal, Condition::NearMint, Some(1.0), at(2024, 5, 1))
    .await
    .unwrap();
  assert_eq!(outcome, PriceOutcome::UnknownCard);
  assert!(s.current_prices(id + 1_000).await.unwrap().is_empty());
  assert!(s.current_prices(id).await.unwrap().is_empty());
}
