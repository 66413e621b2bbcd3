// Tests for Phase 6: EMIT
//
// Test categories from the EMIT phase brief:
// - World block assembly
// - Type block assembly
// - Entity block assembly
// - Location block assembly (description, exits, conditions, blocked messages)
// - Section assembly
// - Effect lowering
// - Determinism

use serde_json::Value as Json;
use urd_compiler::compile_source;

fn emit_ok(source: &str) -> Json {
    let result = compile_source("main.urd.md", source);
    assert!(
        result.success,
        "expected successful compilation, got diagnostics: {:?}",
        result
            .diagnostics
            .all()
            .iter()
            .map(|d| (d.code.clone(), d.message.clone()))
            .collect::<Vec<_>>()
    );
    serde_json::from_str(&result.world.expect("world JSON")).expect("valid JSON")
}

const KEY_PUZZLE: &str = "\
---
world:
  name: Key Puzzle
  start: cell
types:
  Door [interactable]:
    locked: bool = true
entities:
  @cell_door: Door
---
# Cell

A dim stone cell.

-> north: Corridor
  ? @cell_door.locked == false
  ! The door is locked.

# Corridor

A narrow corridor.
";

#[test]
fn world_block_carries_name_and_start() {
    let json = emit_ok(KEY_PUZZLE);
    assert_eq!(json["world"]["urd"], "1");
    assert_eq!(json["world"]["name"], "Key Puzzle");
    assert_eq!(json["world"]["start"], "cell");
}

#[test]
fn type_block_has_property_fields() {
    let json = emit_ok(KEY_PUZZLE);
    let door = &json["types"]["Door"];
    assert_eq!(door["traits"][0], "interactable");
    let locked = &door["properties"]["locked"];
    assert_eq!(locked["type"], "boolean");
    assert_eq!(locked["default"], true);
    assert_eq!(locked["visibility"], "visible");
}

#[test]
fn entity_block_has_type_reference() {
    let json = emit_ok(KEY_PUZZLE);
    let door = &json["entities"]["cell_door"];
    assert_eq!(door["type"], "Door");
}

#[test]
fn location_block_has_description_and_exit_guard() {
    let json = emit_ok(KEY_PUZZLE);
    let cell = &json["locations"]["cell"];
    assert_eq!(cell["description"], "A dim stone cell.");
    let exit = &cell["exits"]["north"];
    assert_eq!(exit["to"], "corridor");
    assert_eq!(exit["condition"], "cell_door.locked == false");
    assert_eq!(exit["blocked_message"], "The door is locked.");
}

#[test]
fn unguarded_location_has_no_condition_key() {
    let json = emit_ok(KEY_PUZZLE);
    let corridor = &json["locations"]["corridor"];
    assert_eq!(corridor["exits"].as_object().unwrap().len(), 0);
}

const DIALOGUE_SOURCE: &str = "\
---
world:
  start: tavern
types:
  Barkeep:
    mood: int = 0
entities:
  @bartender: Barkeep
---
# Tavern

The common room.

== greeting
@bartender: What'll it be?
* Order a drink
  > @bartender.mood = 1
  -> greeting
* Leave
  -> end
";

#[test]
fn dialogue_section_has_prompt_and_choices() {
    let json = emit_ok(DIALOGUE_SOURCE);
    let section = &json["sections"]["main/greeting"];
    assert_eq!(section["id"], "main/greeting");
    assert_eq!(section["prompt"], "What'll it be?");
    let choices = section["choices"].as_array().unwrap();
    assert_eq!(choices.len(), 2);
    assert_eq!(choices[0]["label"], "Order a drink");
    assert_eq!(choices[0]["sticky"], false);
    assert_eq!(choices[0]["goto"], "main/greeting");
    assert_eq!(choices[1]["label"], "Leave");
}

#[test]
fn set_effect_lowers_to_shorthand_json() {
    let json = emit_ok(DIALOGUE_SOURCE);
    let section = &json["sections"]["main/greeting"];
    let effects = section["choices"][0]["effects"].as_array().unwrap();
    assert_eq!(effects[0]["set"], "bartender.mood");
    assert_eq!(effects[0]["to"], 1);
}

#[test]
fn compilation_is_deterministic() {
    let first = compile_source("main.urd.md", KEY_PUZZLE).world.unwrap();
    let second = compile_source("main.urd.md", KEY_PUZZLE).world.unwrap();
    assert_eq!(first, second);
}

#[test]
fn top_level_keys_include_all_blocks() {
    let json = emit_ok(KEY_PUZZLE);
    let obj = json.as_object().unwrap();
    for key in ["world", "types", "entities", "locations", "sections", "rules", "meta", "facts"] {
        assert!(obj.contains_key(key), "missing top-level key '{}'", key);
    }
}
