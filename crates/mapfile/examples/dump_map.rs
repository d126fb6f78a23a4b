//! Simple inspector for world/mission files.
//!
//! Probes the file with both codecs and dumps the recovered document tree.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;

use mapfile::model::{NodeId, Tree};
use mapfile::{Value, load_mission, load_world};

fn format_value(v: &Value) -> String {
    match v {
        Value::Byte(b) => format!("{b}"),
        Value::Int32(i) => format!("{i}"),
        Value::Single(f) => format!("{f:.6}"),
        Value::String(s) => format!("{s:?}"),
        Value::Void => "(void)".to_string(),
    }
}

fn dump(tree: &Tree) {
    // Indentation by depth, recovered from each node's parent chain.
    let depth: RefCell<HashMap<NodeId, usize>> = RefCell::new(HashMap::new());
    depth.borrow_mut().insert(tree.root(), 0);

    tree.walk(
        tree.root(),
        &mut |t, n| {
            let d = t.parent(n).map_or(0, |p| depth.borrow()[&p] + 1);
            depth.borrow_mut().insert(n, d);
            println!("{}{}", "  ".repeat(d), t.node_name(n));
        },
        &mut |t, l| {
            let d = t.leaf_parent(l).map_or(0, |p| depth.borrow()[&p] + 1);
            println!("{}{} = {}", "  ".repeat(d), t.leaf_name(l), format_value(t.value(l)));
        },
    );
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "map.wld".to_string());
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("cannot read {path}: {err}");
            std::process::exit(1);
        }
    };

    match load_world(&bytes) {
        Ok(Some(tree)) => {
            println!("{path}: world file");
            dump(&tree);
            return;
        }
        Ok(None) => {}
        Err(err) => {
            eprintln!("{path}: corrupt world file: {err}");
            std::process::exit(1);
        }
    }

    match load_mission(&bytes) {
        Ok(Some(tree)) => {
            println!("{path}: mission file");
            dump(&tree);
        }
        Ok(None) => {
            eprintln!("{path}: not a world or mission file");
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("{path}: corrupt mission file: {err}");
            std::process::exit(1);
        }
    }
}
