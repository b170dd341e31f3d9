#![no_main]

use arbitrary::Arbitrary;
use commonware_inventory::{Config, Duplicate, Error, RequestQueue};
use libfuzzer_sys::fuzz_target;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Arbitrary, Debug)]
enum Operation {
    Enqueue { key: u8, requester: u8 },
    DequeueBest { key: u8 },
    Clear { key: u8 },
    Forget { requester: u8 },
    Retain { below: u8 },
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    move_to_tail: bool,
    operations: Vec<Operation>,
}

/// Naive reference for the state of a [RequestQueue].
#[derive(Default)]
struct Model {
    lists: HashMap<u8, VecDeque<u8>>,
    registered: HashSet<u8>,
}

impl Model {
    fn enqueue(&mut self, key: u8, requester: u8, move_to_tail: bool) -> usize {
        let list = self.lists.entry(key).or_default();
        match list.iter().position(|r| *r == requester) {
            Some(index) if move_to_tail => {
                list.remove(index);
                list.push_back(requester);
            }
            Some(_) => {}
            None => list.push_back(requester),
        }
        self.registered.insert(requester);
        self.lists.len()
    }

    fn dequeue_best(&mut self, key: u8) -> Result<u8, Error> {
        let list = self.lists.get_mut(&key).ok_or(Error::NotFound)?;
        let best = list.pop_front().ok_or(Error::NotFound)?;
        if list.is_empty() {
            self.lists.remove(&key);
        }
        Ok(best)
    }

    fn forget(&mut self, requester: u8) {
        self.registered.remove(&requester);
        for list in self.lists.values_mut() {
            list.retain(|r| *r != requester);
        }
        self.lists.retain(|_, list| !list.is_empty());
    }
}

fn fuzz(input: FuzzInput) {
    let duplicate = if input.move_to_tail {
        Duplicate::MoveToTail
    } else {
        Duplicate::Ignore
    };
    let mut queue = RequestQueue::new(Config {
        duplicate,
        ..Config::default()
    });
    let mut model = Model::default();

    for op in input.operations {
        match op {
            Operation::Enqueue { key, requester } => {
                let expected = model.enqueue(key, requester, input.move_to_tail);
                assert_eq!(queue.enqueue(key, requester), expected);
            }
            Operation::DequeueBest { key } => {
                assert_eq!(queue.dequeue_best(&key), model.dequeue_best(key));
            }
            Operation::Clear { key } => {
                model.lists.remove(&key);
                queue.clear(&key);
            }
            Operation::Forget { requester } => {
                model.forget(requester);
                queue.forget(&requester);
            }
            Operation::Retain { below } => {
                model.lists.retain(|key, _| *key < below);
                queue.retain(|key| *key < below);
            }
        }

        assert_eq!(queue.len(), model.lists.len());
        assert_eq!(queue.requesters(), model.registered.len());
        assert_eq!(
            queue.pending(),
            model.lists.values().map(|list| list.len()).sum::<usize>()
        );
    }

    // Both indices describe the same pairs
    for (key, list) in model.lists.iter() {
        let queued: VecDeque<u8> = queue.iter_key(key).copied().collect();
        assert_eq!(&queued, list);
        assert_eq!(queue.peek_best(key), list.front());
    }
    for requester in model.registered.iter() {
        let keys: HashSet<u8> = queue.iter_requester(requester).copied().collect();
        let expected: HashSet<u8> = model
            .lists
            .iter()
            .filter(|(_, list)| list.contains(requester))
            .map(|(key, _)| *key)
            .collect();
        assert_eq!(keys, expected);
        assert_eq!(queue.queued(requester), Some(expected.len()));
    }
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});
