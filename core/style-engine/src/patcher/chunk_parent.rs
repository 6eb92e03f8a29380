//! FILENAME: core/style-engine/src/patcher/chunk_parent.rs
//! PURPOSE: Supplies the full subset slice ("chunk parent") to a styling
//! function that is invoked with chunk-sized data.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::StyleError;
use crate::style_func::{
    ApplyFn, Axis, Frame, KwValue, Kwargs, Series, StyleCallable, StyleData, StyleFunc, StyleOutput,
    CHUNK_PARENT_PARAM,
};

/// A directive's own subset and the row or column slices already cut from
/// it. One instance serves every chunk of a directive, so a slice is built
/// once per position.
pub struct SubsetParent {
    frame: Rc<Frame>,
    slices: RefCell<FxHashMap<usize, Rc<Series>>>,
}

impl SubsetParent {
    pub fn new(frame: Rc<Frame>) -> Self {
        SubsetParent {
            frame,
            slices: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn frame(&self) -> &Rc<Frame> {
        &self.frame
    }

    /// The column (`Axis::Index`) or row (`Axis::Columns`) at `position`.
    fn slice(&self, axis: Axis, position: usize) -> Option<Rc<Series>> {
        if let Some(slice) = self.slices.borrow().get(&position) {
            return Some(Rc::clone(slice));
        }
        let slice = Rc::new(match axis {
            Axis::Index => self.frame.column(position)?,
            Axis::Columns => self.frame.row(position)?,
        });
        self.slices.borrow_mut().insert(position, Rc::clone(&slice));
        Some(slice)
    }
}

/// Wraps an apply callable so that every invocation also receives the
/// matching slice of the directive's full subset under `chunk_parent`.
#[derive(Clone)]
pub struct ChunkParentProvider {
    style_func: ApplyFn,
    axis: Option<Axis>,
    parent: Rc<SubsetParent>,
}

impl ChunkParentProvider {
    /// Returns `None` if `style_func` is not an apply callable.
    pub fn new(style_func: &StyleCallable, axis: Option<Axis>, parent: Rc<SubsetParent>) -> Option<Self> {
        match style_func.func() {
            StyleFunc::Apply(f) => Some(ChunkParentProvider {
                style_func: Rc::clone(f),
                axis,
                parent,
            }),
            StyleFunc::Map(_) => None,
        }
    }

    /// Resolves the chunk parent for `data` and delegates.
    pub fn call(&self, data: &StyleData, kwargs: &Kwargs) -> Result<StyleOutput, StyleError> {
        let parent = self.resolve(data)?;
        let mut kwargs = kwargs.clone();
        kwargs.insert(CHUNK_PARENT_PARAM.to_string(), parent);
        (self.style_func)(data, &kwargs)
    }

    fn resolve(&self, data: &StyleData) -> Result<KwValue, StyleError> {
        let (axis, series) = match (self.axis, data) {
            (None, _) | (_, StyleData::Frame(_)) => return Ok(KwValue::Frame(Rc::clone(self.parent.frame()))),
            (Some(axis), StyleData::Series(series)) => (axis, series),
        };
        self.parent
            .slice(axis, series.position)
            .map(KwValue::Series)
            .ok_or(StyleError::ChunkParentLookup {
                axis: match axis {
                    Axis::Index => "column",
                    Axis::Columns => "row",
                },
                position: series.position,
            })
    }

    /// A callable with the signature of `wrapped` whose body goes through
    /// this provider.
    pub fn into_callable(self, wrapped: &StyleCallable) -> StyleCallable {
        wrapped.with_apply_body(Rc::new(move |data: &StyleData, kwargs: &Kwargs| self.call(data, kwargs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::CellValue;

    fn subset_frame() -> Rc<SubsetParent> {
        Rc::new(SubsetParent::new(Rc::new(Frame {
            row_labels: vec!["0".into(), "1".into(), "2".into()],
            row_positions: vec![0, 1, 2],
            column_labels: vec!["a".into()],
            column_positions: vec![5],
            values: vec![vec![1.0.into()], vec![2.0.into()], vec![3.0.into()]],
        })))
    }

    fn chunk_series(position: usize) -> StyleData {
        StyleData::Series(Series {
            name: "a".into(),
            position,
            labels: vec!["1".into()],
            positions: vec![1],
            values: vec![CellValue::Number(2.0)],
        })
    }

    /// Reports the length of the chunk parent it received.
    fn parent_len() -> StyleCallable {
        StyleCallable::apply("parent_len", |_, kwargs| {
            let len = match kwargs.get(CHUNK_PARENT_PARAM) {
                Some(KwValue::Series(s)) => s.len(),
                Some(KwValue::Frame(f)) => f.shape().0,
                _ => 0,
            };
            Ok(StyleOutput::Series(vec![len.to_string()]))
        })
        .with_params(&[CHUNK_PARENT_PARAM])
    }

    #[test]
    fn test_column_axis_resolves_subset_column() {
        let provider = ChunkParentProvider::new(&parent_len(), Some(Axis::Index), subset_frame()).unwrap();
        let out = provider.call(&chunk_series(5), &Kwargs::new()).unwrap();
        assert_eq!(out, StyleOutput::Series(vec!["3".into()]));
    }

    #[test]
    fn test_unknown_identity_is_a_lookup_error() {
        let provider = ChunkParentProvider::new(&parent_len(), Some(Axis::Index), subset_frame()).unwrap();
        let err = provider.call(&chunk_series(4), &Kwargs::new()).unwrap_err();
        assert_eq!(
            err,
            StyleError::ChunkParentLookup {
                axis: "column",
                position: 4
            }
        );
    }

    #[test]
    fn test_wrapped_callable_keeps_signature() {
        let callable = parent_len();
        let provider = ChunkParentProvider::new(&callable, None, subset_frame()).unwrap();
        let wrapped = provider.into_callable(&callable);
        assert_eq!(wrapped.name(), "parent_len");
        assert!(wrapped.accepts_param(CHUNK_PARENT_PARAM));
        let out = wrapped.invoke_apply(&chunk_series(5), &Kwargs::new()).unwrap();
        assert_eq!(out, StyleOutput::Series(vec!["3".into()]));
    }

    #[test]
    fn test_parents_are_shared_not_copied() {
        let parent = subset_frame();
        let seen: Rc<RefCell<Vec<KwValue>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let recording = StyleCallable::apply("recording", move |_, kwargs| {
            if let Some(value) = kwargs.get(CHUNK_PARENT_PARAM) {
                sink.borrow_mut().push(value.clone());
            }
            Ok(StyleOutput::Series(vec![]))
        })
        .with_params(&[CHUNK_PARENT_PARAM]);

        let by_column = ChunkParentProvider::new(&recording, Some(Axis::Index), Rc::clone(&parent)).unwrap();
        by_column.call(&chunk_series(5), &Kwargs::new()).unwrap();
        let next_chunk = ChunkParentProvider::new(&recording, Some(Axis::Index), Rc::clone(&parent)).unwrap();
        next_chunk.call(&chunk_series(5), &Kwargs::new()).unwrap();
        let whole = ChunkParentProvider::new(&recording, None, Rc::clone(&parent)).unwrap();
        whole.call(&chunk_series(5), &Kwargs::new()).unwrap();

        let seen = seen.borrow();
        let (KwValue::Series(first), KwValue::Series(second), KwValue::Frame(frame)) = (&seen[0], &seen[1], &seen[2])
        else {
            panic!("unexpected chunk parents: {:?}", seen);
        };
        assert!(Rc::ptr_eq(first, second));
        assert!(Rc::ptr_eq(frame, parent.frame()));
        assert_eq!(first.numbers().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
    }
}
