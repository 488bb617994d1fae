//! Collapse runs of list items into list nodes

use super::block::{Block, ListItem, ListKind};
use crate::error::BlockError;

/// A list node built from consecutive list items of one kind
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub kind: ListKind,
    pub items: Vec<ListItem>,
}

/// A block after normalization
#[derive(Debug, Clone, PartialEq)]
pub enum GroupedBlock {
    Block(Block),
    List(List),
}

impl GroupedBlock {
    fn list_item_kind(&self) -> Option<ListKind> {
        match self {
            GroupedBlock::Block(block) => block.list_kind(),
            GroupedBlock::List(_) => None,
        }
    }

    fn into_list_item(self) -> Option<ListItem> {
        match self {
            GroupedBlock::Block(Block::BulletedListItem(item))
            | GroupedBlock::Block(Block::NumberedListItem(item)) => Some(item),
            _ => None,
        }
    }
}

/// Group a flat block sequence.
///
/// Bulleted runs are collapsed first, then numbered runs, each in its own
/// pass, so a bulleted run directly followed by a numbered run stays two
/// separate lists.
pub fn group_blocks(blocks: Vec<Block>) -> Result<Vec<GroupedBlock>, BlockError> {
    let mut grouped: Vec<GroupedBlock> = blocks.into_iter().map(GroupedBlock::Block).collect();

    collapse_runs(&mut grouped, ListKind::Bulleted);
    collapse_runs(&mut grouped, ListKind::Numbered);

    ensure_grouped(&grouped)?;
    Ok(grouped)
}

fn collapse_runs(blocks: &mut Vec<GroupedBlock>, kind: ListKind) {
    let mut cursor = 0;

    while cursor < blocks.len() {
        if blocks[cursor].list_item_kind() != Some(kind) {
            cursor += 1;
            continue;
        }

        let end = blocks[cursor..]
            .iter()
            .position(|b| b.list_item_kind() != Some(kind))
            .map_or(blocks.len(), |offset| cursor + offset);

        let items: Vec<ListItem> = blocks
            .drain(cursor..end)
            .filter_map(GroupedBlock::into_list_item)
            .collect();
        debug_assert_eq!(items.len(), end - cursor);

        blocks.insert(cursor, GroupedBlock::List(List { kind, items }));
        cursor += 1;
    }
}

fn ensure_grouped(blocks: &[GroupedBlock]) -> Result<(), BlockError> {
    match blocks.iter().position(|b| b.list_item_kind().is_some()) {
        Some(index) => Err(BlockError::UngroupedListItem { index }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::rich_text::RichTextSpan;

    fn item(text: &str) -> ListItem {
        ListItem {
            text: vec![RichTextSpan::plain(text)],
            children: Vec::new(),
        }
    }

    fn bullet(text: &str) -> Block {
        Block::BulletedListItem(item(text))
    }

    fn numbered(text: &str) -> Block {
        Block::NumberedListItem(item(text))
    }

    fn paragraph(text: &str) -> Block {
        Block::Paragraph(vec![RichTextSpan::plain(text)])
    }

    #[test]
    fn test_empty_input() {
        assert!(group_blocks(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_single_run_becomes_one_list() {
        let grouped = group_blocks(vec![bullet("a"), bullet("b"), bullet("c")]).unwrap();
        assert_eq!(
            grouped,
            vec![GroupedBlock::List(List {
                kind: ListKind::Bulleted,
                items: vec![item("a"), item("b"), item("c")],
            })]
        );

        let grouped = group_blocks(vec![numbered("1"), numbered("2")]).unwrap();
        assert_eq!(grouped.len(), 1);
        assert!(matches!(
            &grouped[0],
            GroupedBlock::List(List { kind: ListKind::Numbered, items }) if items.len() == 2
        ));
    }

    #[test]
    fn test_list_then_paragraph() {
        let grouped =
            group_blocks(vec![bullet("a"), bullet("b"), bullet("c"), paragraph("p")]).unwrap();
        assert_eq!(grouped.len(), 2);
        match &grouped[0] {
            GroupedBlock::List(list) => assert_eq!(list.items.len(), 3),
            other => panic!("expected list, got {:?}", other),
        }
        assert_eq!(grouped[1], GroupedBlock::Block(paragraph("p")));
    }

    #[test]
    fn test_adjacent_kinds_stay_separate() {
        let grouped = group_blocks(vec![bullet("a"), bullet("b"), numbered("1")]).unwrap();
        assert_eq!(grouped.len(), 2);
        assert!(matches!(&grouped[0], GroupedBlock::List(List { kind: ListKind::Bulleted, .. })));
        assert!(matches!(&grouped[1], GroupedBlock::List(List { kind: ListKind::Numbered, .. })));
    }

    #[test]
    fn test_separated_runs_are_not_merged() {
        let grouped =
            group_blocks(vec![bullet("a"), paragraph("p"), bullet("b"), bullet("c")]).unwrap();
        assert_eq!(grouped.len(), 3);
        match (&grouped[0], &grouped[2]) {
            (GroupedBlock::List(first), GroupedBlock::List(second)) => {
                assert_eq!(first.items, vec![item("a")]);
                assert_eq!(second.items, vec![item("b"), item("c")]);
            }
            other => panic!("unexpected grouping {:?}", other),
        }
    }

    #[test]
    fn test_non_list_blocks_keep_positions() {
        let blocks = vec![
            paragraph("intro"),
            numbered("1"),
            Block::Quote(vec![RichTextSpan::plain("q")]),
            bullet("a"),
            paragraph("outro"),
        ];
        let grouped = group_blocks(blocks).unwrap();
        assert_eq!(grouped.len(), 5);
        assert_eq!(grouped[0], GroupedBlock::Block(paragraph("intro")));
        assert_eq!(grouped[4], GroupedBlock::Block(paragraph("outro")));
    }

    #[test]
    fn test_no_list_items_survive() {
        let blocks = vec![
            bullet("a"),
            numbered("1"),
            bullet("b"),
            paragraph("p"),
            numbered("2"),
            numbered("3"),
            bullet("c"),
        ];
        let grouped = group_blocks(blocks).unwrap();
        assert!(grouped.iter().all(|b| b.list_item_kind().is_none()));

        let total: usize = grouped
            .iter()
            .map(|b| match b {
                GroupedBlock::List(list) => list.items.len(),
                GroupedBlock::Block(_) => 1,
            })
            .sum();
        assert_eq!(total, 7);
    }

    #[test]
    fn test_ensure_grouped_rejects_raw_items() {
        let blocks = vec![
            GroupedBlock::Block(paragraph("p")),
            GroupedBlock::Block(bullet("a")),
        ];
        assert_eq!(
            ensure_grouped(&blocks),
            Err(BlockError::UngroupedListItem { index: 1 })
        );
    }
}
