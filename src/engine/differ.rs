//! Power-off set computation - complement of the operator's selection

use proxmox::VirtualMachine;
use std::collections::HashSet;

/// Names present in `all_names` but absent from `power_on`.
///
/// Stable filter: the relative order of `all_names` is preserved, nothing
/// is re-sorted. Selection entries that do not appear in the inventory are
/// ignored (they cannot show up in a complement). Runs in O(n + m) via a
/// membership set rather than a nested scan.
pub fn power_off_set(all_names: &[String], power_on: &[String]) -> Vec<String> {
    let selected: HashSet<&str> = power_on.iter().map(String::as_str).collect();

    all_names
        .iter()
        .filter(|name| !selected.contains(name.as_str()))
        .cloned()
        .collect()
}

/// Extract the name column from an inventory, in inventory order.
pub fn inventory_names(vms: &[VirtualMachine]) -> Vec<String> {
    vms.iter().map(|vm| vm.name.clone()).collect()
}
