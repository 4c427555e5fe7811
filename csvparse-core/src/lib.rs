/*!
`csvparse-core` splits a single line of CSV text into fields.

The tokenizer understands exactly one dialect: fields are separated by `,`
and a `"` toggles a quoted region in which `,` is not a separator. Quote
characters are kept in the field values. There is no escaping beyond that
toggle.

All allocation is fallible. If memory cannot be reserved for a field, the
tokenizer returns `Error::OutOfMemory` instead of aborting, and every field
produced so far for the line is dropped.

# Example

```
use csvparse_core::{count_fields, tokenize};

let line = r#""x,y",z"#;
let n = count_fields(line);
assert_eq!(n, 2);

let fields = tokenize(line, n).unwrap();
assert_eq!(fields, vec![r#""x,y""#, "z"]);
```
*/

#![deny(missing_docs)]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub use crate::error::Error;
pub use crate::tokenizer::{
    count_fields, tokenize, TokenBuffer, INITIAL_TOKEN_CAPACITY,
};

mod error;
mod tokenizer;
