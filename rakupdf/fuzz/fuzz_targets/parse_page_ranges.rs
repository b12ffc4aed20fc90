#![no_main]

use libfuzzer_sys::fuzz_target;
use rakupdf::pages::{PageMove, PageOrderModel, parse_page_ranges};

fuzz_target!(|data: &[u8]| {
    let Some((&count, rest)) = data.split_first() else {
        return;
    };
    let page_count = usize::from(count);
    let spec = String::from_utf8_lossy(rest);

    let Ok(pages) = parse_page_ranges(&spec, page_count) else {
        return;
    };

    let indices = pages.as_slice();
    assert!(indices.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(indices.iter().all(|&index| index < page_count));

    // any selection the parser accepts must survive every move as a permutation
    let mut model = PageOrderModel::new(page_count);
    model.select_all_of(indices);
    for page_move in [PageMove::Down, PageMove::ToTop, PageMove::Up, PageMove::ToBottom] {
        model.apply(page_move);
        let mut order = model.order().to_vec();
        order.sort_unstable();
        assert!(order.iter().copied().eq(0..page_count));
    }
});
