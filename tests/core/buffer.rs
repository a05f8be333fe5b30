//! Buffer cursor mechanics: the `used` bookkeeping every streaming call
//! depends on.

use deflater::{InputBuffer, OutputBuffer};

#[test]
fn input_cursor_advances() {
    let data = [1u8, 2, 3, 4, 5];
    let mut input = InputBuffer::new(&data);
    assert_eq!(input.size(), 5);
    assert_eq!(input.used(), 0);
    assert_eq!(input.remaining(), &[1, 2, 3, 4, 5]);
    assert!(!input.is_exhausted());

    input.consume(2);
    assert_eq!(input.used(), 2);
    assert_eq!(input.remaining(), &[3, 4, 5]);

    input.consume(3);
    assert!(input.is_exhausted());
    assert_eq!(input.remaining(), &[] as &[u8]);
}

#[test]
fn empty_input_is_exhausted() {
    let input = InputBuffer::new(&[]);
    assert!(input.is_exhausted());
    assert_eq!(input.size(), 0);
}

#[test]
fn output_push_copies_what_fits() {
    let mut storage = [0u8; 4];
    let mut output = OutputBuffer::new(&mut storage);
    assert_eq!(output.capacity(), 4);
    assert_eq!(output.push(&[1, 2]), 2);
    assert_eq!(output.used(), 2);
    assert_eq!(output.remaining(), 2);

    // Only two of four bytes fit.
    assert_eq!(output.push(&[3, 4, 5, 6]), 2);
    assert!(output.is_full());
    assert_eq!(output.written(), &[1, 2, 3, 4]);

    assert_eq!(output.push(&[9]), 0);
}

#[test]
fn output_push_byte() {
    let mut storage = [0u8; 2];
    let mut output = OutputBuffer::new(&mut storage);
    assert!(output.push_byte(7));
    assert!(output.push_byte(8));
    assert!(!output.push_byte(9));
    assert_eq!(output.written(), &[7, 8]);
}

#[test]
#[should_panic(expected = "consume past end of input")]
fn consume_past_end_panics() {
    let data = [1u8];
    let mut input = InputBuffer::new(&data);
    input.consume(2);
}
