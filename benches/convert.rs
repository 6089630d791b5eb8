#[macro_use]
extern crate bencher;

use bencher::Bencher;
use gb2gff::convert_stream;
use gb2gff::reader::GffReader;

const MULTI: &[u8] = include_bytes!("../tests/multi.gb");

fn multi_convert(b: &mut Bencher) {
    b.iter(|| {
        let mut out = Vec::with_capacity(16 * 1024);
        convert_stream(MULTI, &mut out).unwrap();
        out
    });
}

fn multi_read_back(b: &mut Bencher) {
    let mut gff = Vec::new();
    convert_stream(MULTI, &mut gff).unwrap();
    b.iter(|| GffReader::new(&gff[..]).count());
}

benchmark_group!(benches, multi_convert, multi_read_back);
benchmark_main!(benches);
