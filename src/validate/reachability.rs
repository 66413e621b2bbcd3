/// Step 9: Reachability validation — BFS over resolved exits from `world.start`.
///
/// Diagnostics: URD430 (unreachable location), URD433 (dead-end dialogue
/// section), URD434 (section/exit name collision).
///
/// URD432 ("impossible choice") is deliberately NOT emitted here — it is
/// FactSet-derived and is emitted once, from `analyze::check_impossible_choice`.
/// This module only computes the reachable-location set.
use std::collections::{HashSet, VecDeque};

use crate::diagnostics::DiagnosticCollector;
use crate::facts::FactSet;
use crate::symbol_table::SymbolTable;

pub fn check_reachability(
    fact_set: &FactSet,
    symbol_table: &SymbolTable,
    diagnostics: &mut DiagnosticCollector,
) {
    let start = match &symbol_table.world_start {
        Some(s) => s.clone(),
        None => return,
    };

    let reachable = reachable_locations(fact_set, &start);

    // URD430: locations never reached by the BFS.
    for (loc_id, loc_sym) in &symbol_table.locations {
        if !reachable.contains(loc_id) {
            diagnostics.warning(
                "URD430",
                format!(
                    "Location '{}' is never reachable from world.start ('{}').",
                    loc_id, start
                ),
                loc_sym.declared_in.clone(),
            );
        }
    }

    // URD433: a section whose only choices are one-shot and none jumps anywhere.
    for (section_id, section_sym) in &symbol_table.sections {
        if section_sym.choices.is_empty() {
            continue;
        }
        let all_one_shot = section_sym.choices.iter().all(|c| !c.sticky);
        if !all_one_shot {
            continue;
        }
        let has_jump = fact_set
            .jumps()
            .iter()
            .any(|j| &j.from_section == section_id);
        if !has_jump {
            diagnostics.warning(
                "URD433",
                format!(
                    "Section '{}' has only one-shot choices and no jump. Once every choice is \
                     exhausted there is no fallthrough.",
                    section_id
                ),
                section_sym.declared_in.clone(),
            );
        }
    }

    // URD434: a section name collides with a resolved exit name reachable from
    // the same location (ambiguous `-> name` target).
    for (loc_id, loc_sym) in &symbol_table.locations {
        for exit_name in loc_sym.exits.keys() {
            let collision_key = format!("{}/{}", loc_id, exit_name);
            if symbol_table.sections.contains_key(&collision_key) {
                diagnostics.warning(
                    "URD434",
                    format!(
                        "Exit '{}' at location '{}' shares its name with a dialogue section. \
                         A bare jump target '{}' is ambiguous.",
                        exit_name, loc_id, exit_name
                    ),
                    loc_sym.declared_in.clone(),
                );
            }
        }
    }
}

fn reachable_locations(fact_set: &FactSet, start: &str) -> HashSet<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    seen.insert(start.to_string());
    queue.push_back(start.to_string());

    while let Some(current) = queue.pop_front() {
        for edge in fact_set.exits() {
            if edge.from_location == current && seen.insert(edge.to_location.clone()) {
                queue.push_back(edge.to_location.clone());
            }
        }
    }

    seen
}
