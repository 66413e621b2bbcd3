/// Phase 6: EMIT — validated ASTs + symbol table + FactSet to `.urd.json`.
///
/// Input:  Validated ASTs + `SymbolTable` (zero Error-severity diagnostics)
///         plus the `FactSet`/`PropertyDependencyIndex` already built by the
///         pipeline driver.
/// Output: `.urd.json` string.
///
/// EMIT runs only when the diagnostic collector contains zero errors. It
/// traverses pre-validated data structures in a fixed, deterministic order
/// and writes the eight top-level blocks required by the published schema:
/// world, types, entities, locations, sections, rules, meta, facts. Sequence
/// and action detail fold into `sections` and into each choice's own object
/// rather than appearing as sibling top-level keys.
///
/// Key guarantee: conforms to the published schema, deterministic, `urd: "1"`
/// injected, byte-identical across repeated compilations of the same input.
///
/// Diagnostic code range: URD500–URD599 (reserved; EMIT does not currently
/// raise diagnostics of its own — malformed input is caught upstream).

use indexmap::IndexMap;
use serde_json::{Map, Value as Json};

use crate::ast::{
    ConditionExpr, ContainerKind, ContentNode, DestinationKind, Effect, EffectType,
};
use crate::diagnostics::DiagnosticCollector;
use crate::facts::{FactSet, PropertyDependencyIndex, PropertyKey};
use crate::graph::DependencyGraph;
use crate::slugify::slugify;
use crate::symbol_table::{PropertySymbol, PropertyType, SymbolTable, Value};

/// Emit the compiled `.urd.json` string from the validated world.
///
/// Precondition: `diagnostics.has_errors()` is `false`.
pub fn emit(
    graph: &DependencyGraph,
    symbol_table: &SymbolTable,
    fact_set: &FactSet,
    property_index: &PropertyDependencyIndex,
    _diagnostics: &mut DiagnosticCollector,
) -> String {
    let walk = walk_content(graph, symbol_table);

    let mut root = Map::new();
    root.insert("$schema".to_string(), Json::String("urd.schema.json".to_string()));
    root.insert("world".to_string(), emit_world(symbol_table));
    root.insert("types".to_string(), emit_types(symbol_table));
    root.insert("entities".to_string(), emit_entities(symbol_table));
    root.insert("locations".to_string(), emit_locations(symbol_table, &walk));
    root.insert("sections".to_string(), emit_sections(symbol_table, &walk));
    root.insert("rules".to_string(), emit_rules(graph, symbol_table));
    root.insert("meta".to_string(), emit_meta());
    root.insert("facts".to_string(), emit_facts(fact_set, property_index));

    let value = Json::Object(root);
    let mut pretty = serde_json::to_string_pretty(&value).unwrap_or_default();
    pretty.push('\n');
    pretty
}

// ── world ──

fn emit_world(symbol_table: &SymbolTable) -> Json {
    let mut obj = Map::new();
    obj.insert("urd".to_string(), Json::String("1".to_string()));
    obj.insert(
        "name".to_string(),
        symbol_table.world_name.clone().map(Json::String).unwrap_or(Json::Null),
    );
    obj.insert(
        "start".to_string(),
        symbol_table.world_start.clone().map(Json::String).unwrap_or(Json::Null),
    );
    obj.insert(
        "entry".to_string(),
        symbol_table.world_entry.clone().map(Json::String).unwrap_or(Json::Null),
    );
    Json::Object(obj)
}

// ── types ──

fn emit_types(symbol_table: &SymbolTable) -> Json {
    let mut obj = Map::new();
    for (name, type_sym) in &symbol_table.types {
        let mut type_obj = Map::new();
        type_obj.insert(
            "traits".to_string(),
            Json::Array(type_sym.traits.iter().cloned().map(Json::String).collect()),
        );

        let mut props = Map::new();
        for (prop_name, prop) in &type_sym.properties {
            props.insert(prop_name.clone(), emit_property(prop));
        }
        type_obj.insert("properties".to_string(), Json::Object(props));

        obj.insert(name.clone(), Json::Object(type_obj));
    }
    Json::Object(obj)
}

fn emit_property(prop: &PropertySymbol) -> Json {
    let mut obj = Map::new();
    obj.insert(
        "type".to_string(),
        Json::String(property_type_str(&prop.property_type).to_string()),
    );
    obj.insert(
        "visibility".to_string(),
        Json::String(
            match prop.visibility {
                crate::symbol_table::Visibility::Hidden => "hidden",
                crate::symbol_table::Visibility::Visible => "visible",
            }
            .to_string(),
        ),
    );
    obj.insert(
        "default".to_string(),
        prop.default.as_ref().map(value_to_json).unwrap_or(Json::Null),
    );
    if let Some(values) = &prop.values {
        obj.insert(
            "values".to_string(),
            Json::Array(values.iter().cloned().map(Json::String).collect()),
        );
    }
    if let Some(min) = prop.min {
        obj.insert("min".to_string(), json_number(min));
    }
    if let Some(max) = prop.max {
        obj.insert("max".to_string(), json_number(max));
    }
    if let Some(ref_type) = &prop.ref_type {
        obj.insert("ref_type".to_string(), Json::String(ref_type.clone()));
    }
    if let Some(element_type) = &prop.element_type {
        obj.insert(
            "element_type".to_string(),
            Json::String(property_type_str(element_type).to_string()),
        );
    }
    Json::Object(obj)
}

fn property_type_str(pt: &PropertyType) -> &'static str {
    match pt {
        PropertyType::Boolean => "boolean",
        PropertyType::Integer => "integer",
        PropertyType::Number => "number",
        PropertyType::String => "string",
        PropertyType::Enum => "enum",
        PropertyType::Ref => "ref",
        PropertyType::List => "list",
    }
}

fn json_number(n: f64) -> Json {
    serde_json::Number::from_f64(n).map(Json::Number).unwrap_or(Json::Null)
}

fn value_to_json(v: &Value) -> Json {
    match v {
        Value::String(s) => Json::String(s.clone()),
        Value::Integer(i) => Json::Number((*i).into()),
        Value::Number(n) => json_number(*n),
        Value::Boolean(b) => Json::Bool(*b),
        Value::EntityRef(id) => Json::String(format!("@{}", id)),
        Value::List(items) => Json::Array(items.iter().map(value_to_json).collect()),
    }
}

/// Parse an effect's raw value expression into JSON: booleans and numbers
/// lower to literals, everything else (arithmetic, string expressions) stays
/// a string so downstream tooling can evaluate it.
fn parse_value_expr(expr: &str) -> Json {
    match expr {
        "true" => return Json::Bool(true),
        "false" => return Json::Bool(false),
        _ => {}
    }
    if let Ok(i) = expr.parse::<i64>() {
        return Json::Number(i.into());
    }
    if let Ok(f) = expr.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Json::Number(n);
        }
    }
    Json::String(expr.to_string())
}

fn strip_at(s: &str) -> &str {
    s.strip_prefix('@').unwrap_or(s)
}

// ── entities ──

fn emit_entities(symbol_table: &SymbolTable) -> Json {
    let mut obj = Map::new();
    for (id, entity) in &symbol_table.entities {
        let mut entity_obj = Map::new();
        entity_obj.insert("type".to_string(), Json::String(entity.type_name.clone()));

        let mut overrides = Map::new();
        for (prop_name, value) in &entity.property_overrides {
            overrides.insert(prop_name.clone(), value_to_json(value));
        }
        entity_obj.insert("properties".to_string(), Json::Object(overrides));

        obj.insert(id.clone(), Json::Object(entity_obj));
    }
    Json::Object(obj)
}

// ── condition / effect lowering ──

fn condition_expr_to_string(expr: &ConditionExpr) -> String {
    match expr {
        ConditionExpr::PropertyComparison(pc) => {
            format!("{}.{} {} {}", strip_at(&pc.entity_ref), pc.property, pc.operator, pc.value)
        }
        ConditionExpr::ContainmentCheck(cc) => {
            let container = match cc.annotation.as_ref().and_then(|a| a.container_kind.as_ref()) {
                Some(ContainerKind::KeywordPlayer) => "player".to_string(),
                Some(ContainerKind::KeywordHere) => "here".to_string(),
                Some(ContainerKind::EntityRef(id)) => id.clone(),
                Some(ContainerKind::LocationRef(id)) => id.clone(),
                None => cc.container_ref.clone(),
            };
            if cc.negated {
                format!("{} not in {}", strip_at(&cc.entity_ref), container)
            } else {
                format!("{} in {}", strip_at(&cc.entity_ref), container)
            }
        }
        ConditionExpr::ExhaustionCheck(ec) => format!("exhausted {}", ec.section_name),
    }
}

fn effect_to_json(effect: &Effect) -> Json {
    let mut obj = Map::new();
    match &effect.effect_type {
        EffectType::Set { target_prop, operator, value_expr } => {
            obj.insert("set".to_string(), Json::String(strip_at(target_prop).to_string()));
            if operator != "=" {
                obj.insert("operator".to_string(), Json::String(operator.clone()));
            }
            obj.insert("to".to_string(), parse_value_expr(value_expr));
        }
        EffectType::Move { entity_ref, destination_ref } => {
            let destination =
                match effect.annotation.as_ref().and_then(|a| a.destination_kind.as_ref()) {
                    Some(DestinationKind::KeywordPlayer) => "player".to_string(),
                    Some(DestinationKind::KeywordHere) => "here".to_string(),
                    Some(DestinationKind::EntityRef(id)) => id.clone(),
                    Some(DestinationKind::LocationRef(id)) => id.clone(),
                    None => destination_ref.clone(),
                };
            obj.insert("move".to_string(), Json::String(strip_at(entity_ref).to_string()));
            obj.insert("to".to_string(), Json::String(destination));
        }
        EffectType::Reveal { target_prop } => {
            obj.insert("reveal".to_string(), Json::String(strip_at(target_prop).to_string()));
        }
        EffectType::Destroy { entity_ref } => {
            obj.insert("destroy".to_string(), Json::String(strip_at(entity_ref).to_string()));
        }
    }
    Json::Object(obj)
}

// ── single-pass content walk ──
//
// Locations and dialogue sections are both flat spans of top-level content
// delimited by headings/labels (mirroring the LINK collection pass). One
// walk over every file gathers what LINK doesn't already retain: location
// descriptions and exit guards, and the full dialogue/action tree, which is
// read straight from the AST rather than re-derived from the symbol table.

struct LocationExtra {
    description: Option<String>,
    exit_guards: IndexMap<String, (Option<String>, Option<String>)>,
}

struct WalkResult {
    locations: IndexMap<String, LocationExtra>,
    sections: IndexMap<String, Json>,
}

fn walk_content(graph: &DependencyGraph, symbol_table: &SymbolTable) -> WalkResult {
    let mut result = WalkResult {
        locations: IndexMap::new(),
        sections: IndexMap::new(),
    };

    for file_path in graph.topological_order() {
        let node = match graph.nodes.get(file_path.as_str()) {
            Some(n) => n,
            None => continue,
        };
        let file_stem = crate::graph::file_stem(file_path);

        let mut current_location: Option<String> = None;
        let mut current_section: Option<(String, Vec<&ContentNode>)> = None;

        for content in &node.ast.content {
            match content {
                ContentNode::LocationHeading(loc) => {
                    if let Some((id, items)) = current_section.take() {
                        result
                            .sections
                            .insert(id.clone(), build_section(&id, &items, symbol_table));
                    }
                    let id = slugify(&loc.display_name);
                    result
                        .locations
                        .entry(id.clone())
                        .or_insert_with(|| LocationExtra { description: None, exit_guards: IndexMap::new() });
                    current_location = Some(id);
                }
                ContentNode::SectionLabel(label) => {
                    if let Some((id, items)) = current_section.take() {
                        result
                            .sections
                            .insert(id.clone(), build_section(&id, &items, symbol_table));
                    }
                    let compiled_id = format!("{}/{}", file_stem, label.name);
                    current_section = Some((compiled_id, Vec::new()));
                }
                ContentNode::Prose(p) => {
                    if let Some(loc_id) = &current_location {
                        if let Some(extra) = result.locations.get_mut(loc_id) {
                            if extra.description.is_none() {
                                extra.description = Some(p.text.clone());
                            }
                        }
                    }
                    if let Some((_, items)) = current_section.as_mut() {
                        items.push(content);
                    }
                }
                ContentNode::ExitDeclaration(exit) => {
                    if let Some(loc_id) = &current_location {
                        if let Some(extra) = result.locations.get_mut(loc_id) {
                            let condition = exit
                                .children
                                .iter()
                                .find_map(|c| match c {
                                    ContentNode::Condition(cond) => {
                                        Some(condition_expr_to_string(&cond.expr))
                                    }
                                    _ => None,
                                });
                            let blocked_message = exit
                                .children
                                .iter()
                                .find_map(|c| match c {
                                    ContentNode::BlockedMessage(bm) => Some(bm.text.clone()),
                                    _ => None,
                                });
                            extra
                                .exit_guards
                                .insert(exit.direction.clone(), (condition, blocked_message));
                        }
                    }
                }
                other => {
                    if let Some((_, items)) = current_section.as_mut() {
                        items.push(other);
                    }
                }
            }
        }

        if let Some((id, items)) = current_section.take() {
            result
                .sections
                .insert(id.clone(), build_section(&id, &items, symbol_table));
        }
    }

    result
}

/// Build one dialogue section (or, recursively, one nested choice's body)
/// from its flat span of content nodes.
fn build_section(section_id: &str, items: &[&ContentNode], symbol_table: &SymbolTable) -> Json {
    let mut obj = Map::new();
    obj.insert("id".to_string(), Json::String(section_id.to_string()));

    let mut prompt: Option<String> = None;
    let mut conditions: Vec<String> = Vec::new();
    let mut choices: Vec<Json> = Vec::new();
    let mut on_exhausted: Option<String> = None;
    let mut seen_choice = false;

    for item in items {
        match item {
            ContentNode::EntitySpeech(s) if !seen_choice && prompt.is_none() => {
                prompt = Some(s.text.clone());
            }
            ContentNode::StageDirection(s) if !seen_choice && prompt.is_none() => {
                prompt = Some(s.text.clone());
            }
            ContentNode::Condition(cond) if !seen_choice => {
                conditions.push(condition_expr_to_string(&cond.expr));
            }
            ContentNode::OrConditionBlock(or_block) if !seen_choice => {
                conditions.extend(or_block.conditions.iter().map(condition_expr_to_string));
            }
            ContentNode::Choice(choice) => {
                seen_choice = true;
                choices.push(build_choice(section_id, choice, symbol_table));
            }
            ContentNode::Prose(p) if seen_choice => {
                on_exhausted = Some(p.text.clone());
            }
            _ => {}
        }
    }

    if let Some(p) = prompt {
        obj.insert("prompt".to_string(), Json::String(p));
    }
    if !conditions.is_empty() {
        obj.insert("conditions".to_string(), Json::Array(conditions.into_iter().map(Json::String).collect()));
    }
    obj.insert("choices".to_string(), Json::Array(choices));
    if let Some(p) = on_exhausted {
        obj.insert("on_exhausted".to_string(), Json::String(p));
    }

    Json::Object(obj)
}

fn build_choice(section_id: &str, choice: &crate::ast::Choice, symbol_table: &SymbolTable) -> Json {
    let slug = slugify(&choice.label);
    let choice_id = format!("{}/{}", section_id, slug);

    let mut obj = Map::new();
    obj.insert("label".to_string(), Json::String(choice.label.clone()));
    obj.insert("sticky".to_string(), Json::Bool(choice.sticky));

    let mut conditions: Vec<String> = Vec::new();
    let mut effects: Vec<Json> = Vec::new();
    let mut nested: Vec<Json> = Vec::new();
    let mut goto: Option<String> = None;

    for child in &choice.content {
        match child {
            ContentNode::Condition(cond) => conditions.push(condition_expr_to_string(&cond.expr)),
            ContentNode::OrConditionBlock(or_block) => {
                conditions.extend(or_block.conditions.iter().map(condition_expr_to_string));
            }
            ContentNode::Effect(effect) => effects.push(effect_to_json(effect)),
            ContentNode::Jump(jump) => {
                let target = jump
                    .annotation
                    .as_ref()
                    .and_then(|a| a.resolved_section.clone().or_else(|| a.resolved_location.clone()))
                    .unwrap_or_else(|| jump.target.clone());
                goto = Some(target);
            }
            ContentNode::Choice(sub) => {
                nested.push(build_choice(section_id, sub, symbol_table));
            }
            _ => {}
        }
    }

    // A bare `* Label -> target` arrow (not a nested `-> name` jump line) resolves
    // straight onto the choice itself; fall back to it only when no nested Jump
    // already supplied a goto.
    if goto.is_none() {
        if let Some(ann) = &choice.annotation {
            goto = ann.resolved_section.clone().or_else(|| ann.resolved_location.clone());
        }
    }

    if !conditions.is_empty() {
        obj.insert("conditions".to_string(), Json::Array(conditions.into_iter().map(Json::String).collect()));
    }
    if !effects.is_empty() {
        obj.insert("effects".to_string(), Json::Array(effects));
    }
    if let Some(g) = goto {
        obj.insert("goto".to_string(), Json::String(g));
    }
    if !nested.is_empty() {
        obj.insert("choices".to_string(), Json::Array(nested));
    }

    if symbol_table.actions.contains_key(&choice_id) {
        if let Some(target) = &choice.target {
            obj.insert("target".to_string(), Json::String(target.clone()));
        }
        if let Some(target_type) = &choice.target_type {
            obj.insert("target_type".to_string(), Json::String(target_type.clone()));
        }
    }

    Json::Object(obj)
}

// ── locations ──

fn emit_locations(symbol_table: &SymbolTable, walk: &WalkResult) -> Json {
    let mut obj = Map::new();
    for (id, loc) in &symbol_table.locations {
        let mut loc_obj = Map::new();
        let extra = walk.locations.get(id);
        loc_obj.insert(
            "description".to_string(),
            extra
                .and_then(|e| e.description.clone())
                .map(Json::String)
                .unwrap_or(Json::Null),
        );
        loc_obj.insert(
            "contains".to_string(),
            Json::Array(loc.contains.iter().cloned().map(Json::String).collect()),
        );

        let mut exits = Map::new();
        for (exit_name, exit) in &loc.exits {
            let mut exit_obj = Map::new();
            exit_obj.insert(
                "to".to_string(),
                exit.resolved_destination.clone().map(Json::String).unwrap_or(Json::Null),
            );
            if let Some((condition, blocked_message)) =
                extra.and_then(|e| e.exit_guards.get(exit_name))
            {
                if let Some(c) = condition {
                    exit_obj.insert("condition".to_string(), Json::String(c.clone()));
                }
                if let Some(b) = blocked_message {
                    exit_obj.insert("blocked_message".to_string(), Json::String(b.clone()));
                }
            }
            exits.insert(exit_name.clone(), Json::Object(exit_obj));
        }
        loc_obj.insert("exits".to_string(), Json::Object(exits));

        obj.insert(id.clone(), Json::Object(loc_obj));
    }
    Json::Object(obj)
}

// ── sections ──
//
// A Sequence is a refinement of Section (turn structure nested under a
// Location), not a separate top-level entity, so its phases fold into the
// same `sections` block as ordinary dialogue sections rather than a
// sibling key.

fn emit_sections(symbol_table: &SymbolTable, walk: &WalkResult) -> Json {
    let mut obj = Map::new();
    for (id, section) in &walk.sections {
        obj.insert(id.clone(), section.clone());
    }
    for (id, seq) in &symbol_table.sequences {
        let mut seq_obj = Map::new();
        seq_obj.insert("id".to_string(), Json::String(id.clone()));
        let phases: Vec<Json> = seq
            .phases
            .iter()
            .map(|phase| {
                let mut p = Map::new();
                p.insert("id".to_string(), Json::String(phase.id.clone()));
                p.insert("advance".to_string(), Json::String(phase.advance.clone()));
                p.insert(
                    "action".to_string(),
                    phase.action.clone().map(Json::String).unwrap_or(Json::Null),
                );
                if let Some(actions) = &phase.actions {
                    p.insert(
                        "actions".to_string(),
                        Json::Array(actions.iter().cloned().map(Json::String).collect()),
                    );
                }
                p.insert(
                    "rule".to_string(),
                    phase.rule.clone().map(Json::String).unwrap_or(Json::Null),
                );
                Json::Object(p)
            })
            .collect();
        seq_obj.insert("phases".to_string(), Json::Array(phases));
        obj.insert(id.clone(), Json::Object(seq_obj));
    }
    Json::Object(obj)
}

// ── rules ──

fn emit_rules(graph: &DependencyGraph, symbol_table: &SymbolTable) -> Json {
    let mut obj = Map::new();

    for file_path in graph.topological_order() {
        let node = match graph.nodes.get(file_path.as_str()) {
            Some(n) => n,
            None => continue,
        };
        for content in &node.ast.content {
            if let ContentNode::RuleBlock(rule_block) = content {
                if !symbol_table.rules.contains_key(&rule_block.name) || obj.contains_key(&rule_block.name) {
                    continue;
                }
                let mut rule_obj = Map::new();
                rule_obj.insert("actor".to_string(), Json::String(strip_at(&rule_block.actor).to_string()));
                rule_obj.insert("trigger".to_string(), Json::String(rule_block.trigger.clone()));
                if let Some(select) = &rule_block.select {
                    let mut select_obj = Map::new();
                    select_obj.insert("variable".to_string(), Json::String(select.variable.clone()));
                    select_obj.insert(
                        "from".to_string(),
                        Json::Array(select.entity_refs.iter().cloned().map(Json::String).collect()),
                    );
                    if !select.where_clauses.is_empty() {
                        select_obj.insert(
                            "where".to_string(),
                            Json::Array(
                                select
                                    .where_clauses
                                    .iter()
                                    .map(|e| Json::String(condition_expr_to_string(e)))
                                    .collect(),
                            ),
                        );
                    }
                    rule_obj.insert("select".to_string(), Json::Object(select_obj));
                }
                if !rule_block.where_clauses.is_empty() {
                    rule_obj.insert(
                        "where".to_string(),
                        Json::Array(
                            rule_block
                                .where_clauses
                                .iter()
                                .map(|e| Json::String(condition_expr_to_string(e)))
                                .collect(),
                        ),
                    );
                }
                rule_obj.insert(
                    "effects".to_string(),
                    Json::Array(rule_block.effects.iter().map(effect_to_json).collect()),
                );
                obj.insert(rule_block.name.clone(), Json::Object(rule_obj));
            }
        }
    }

    Json::Object(obj)
}

// ── meta ──

fn emit_meta() -> Json {
    let mut obj = Map::new();
    obj.insert(
        "generated_by".to_string(),
        Json::String(format!("urd-compiler {}", env!("CARGO_PKG_VERSION"))),
    );
    Json::Object(obj)
}

// ── facts ──

fn emit_facts(fact_set: &FactSet, property_index: &PropertyDependencyIndex) -> Json {
    let mut obj = match fact_set.to_json() {
        Json::Object(o) => o,
        _ => Map::new(),
    };
    obj.insert("property_index".to_string(), property_index_to_json(property_index));
    Json::Object(obj)
}

fn property_index_to_json(index: &PropertyDependencyIndex) -> Json {
    let mut keys: Vec<PropertyKey> = index
        .read_properties()
        .chain(index.written_properties())
        .cloned()
        .collect();
    keys.sort_by(|a, b| (&a.entity_type, &a.property).cmp(&(&b.entity_type, &b.property)));
    keys.dedup_by(|a, b| a.entity_type == b.entity_type && a.property == b.property);

    let arr: Vec<Json> = keys
        .into_iter()
        .map(|key| {
            let reads = index.reads_of(&key);
            let writes = index.writes_of(&key);
            let orphaned = if reads.is_empty() && !writes.is_empty() {
                Some("never_read")
            } else if writes.is_empty() && !reads.is_empty() {
                Some("never_written")
            } else {
                None
            };
            let mut obj = Map::new();
            obj.insert("entity_type".to_string(), Json::String(key.entity_type));
            obj.insert("property".to_string(), Json::String(key.property));
            obj.insert("read_count".to_string(), Json::Number(reads.len().into()));
            obj.insert("write_count".to_string(), Json::Number(writes.len().into()));
            obj.insert(
                "orphaned".to_string(),
                orphaned.map(|s| Json::String(s.to_string())).unwrap_or(Json::Null),
            );
            Json::Object(obj)
        })
        .collect();

    Json::Array(arr)
}
