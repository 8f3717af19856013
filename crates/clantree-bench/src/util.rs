use clantree_core::{Gender, MemberRecord};

/// Synthetic clan of `member_count` records. Each member's parent is picked
/// so families have between one and `max_children` children, which gives
/// both bushy and deep regions.
pub fn generate_clan(member_count: usize, max_children: usize) -> Vec<MemberRecord> {
    let max_children = max_children.max(1);
    let mut records = Vec::with_capacity(member_count);
    let mut parent = 0usize;
    let mut children_of_parent = 0usize;

    for i in 0..member_count {
        let mut record = MemberRecord::new(format!("m{i}"), format!("Member {i}"))
            .with_gender(if i % 2 == 0 { Gender::Male } else { Gender::Female });
        if i > 0 {
            // Vary family size with a cheap deterministic hash.
            let family_size = 1 + (parent * 7 + 3) % max_children;
            if children_of_parent >= family_size {
                parent += 1;
                children_of_parent = 0;
            }
            record = record.with_parent(format!("m{parent}"));
            children_of_parent += 1;
        }
        records.push(record);
    }
    records
}

/// The same clan as bridge JSON.
pub fn generate_clan_json(member_count: usize, max_children: usize) -> String {
    serde_json::to_string(&generate_clan(member_count, max_children)).unwrap_or_default()
}
