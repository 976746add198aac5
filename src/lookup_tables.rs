//! Numeric lookup tables
//!
//! These tables are data, not logic. They encode calibrated exponential and logarithmic curves and are indexed
//! directly by the tick-path code, every lookup is clamped to the table bounds by the caller.

/// Number of entries in the frequency table
pub const FRQ_TABLE_SIZE: usize = 128;

/// The largest valid index into the frequency table
pub const FRQ_TABLE_MAX_IX: usize = FRQ_TABLE_SIZE - 1;

/// Offset between a note number and its frequency table slot
///
/// Slot `n + FRQ_TABLE_NOTE_OFFSET` holds the chip frequency of MIDI note `n`.
pub const FRQ_TABLE_NOTE_OFFSET: usize = 21;

/// Number of LFO rates replaced by MIDI clock locked incrementers in clock sync mode
pub const LFO_MCLK_RATES: usize = 11;

/// The first LFO rate which uses the MIDI clock locked incrementers
pub const LFO_MCLK_FIRST_RATE: usize = 256 - LFO_MCLK_RATES;

/// Chip frequency register values, one per semitone, for a 1MHz chip clock.
///
/// Also used as the exponential rate source for curve-shaped envelope segments.
pub static FRQ_TABLE: [u16; 128] = [
    0x0029, 0x002b, 0x002e, 0x0030, 0x0033, 0x0036, 0x003a, 0x003d, 0x0041, 0x0045, 0x0049, 0x004d,
    0x0052, 0x0056, 0x005c, 0x0061, 0x0067, 0x006d, 0x0073, 0x007a, 0x0081, 0x0089, 0x0091, 0x009a,
    0x00a3, 0x00ad, 0x00b7, 0x00c2, 0x00ce, 0x00da, 0x00e7, 0x00f4, 0x0103, 0x0112, 0x0123, 0x0134,
    0x0146, 0x015a, 0x016e, 0x0184, 0x019b, 0x01b3, 0x01cd, 0x01e9, 0x0206, 0x0225, 0x0245, 0x0268,
    0x028c, 0x02b3, 0x02dc, 0x0308, 0x0336, 0x0367, 0x039b, 0x03d2, 0x040c, 0x0449, 0x048b, 0x04d0,
    0x0519, 0x0567, 0x05b9, 0x0610, 0x066c, 0x06ce, 0x0735, 0x07a3, 0x0817, 0x0893, 0x0915, 0x099f,
    0x0a32, 0x0acd, 0x0b72, 0x0c20, 0x0cd8, 0x0d9c, 0x0e6b, 0x0f46, 0x102f, 0x1125, 0x122a, 0x133f,
    0x1464, 0x159a, 0x16e3, 0x183f, 0x19b1, 0x1b38, 0x1cd6, 0x1e8d, 0x205e, 0x224b, 0x2455, 0x267e,
    0x28c8, 0x2b34, 0x2dc6, 0x307f, 0x3361, 0x366f, 0x39ac, 0x3d1a, 0x40bc, 0x4495, 0x48a9, 0x4cfc,
    0x518f, 0x5669, 0x5b8c, 0x60fe, 0x66c2, 0x6cdf, 0x7358, 0x7a34, 0x8178, 0x892b, 0x9153, 0x99f7,
    0xa31f, 0xacd2, 0xb719, 0xc1fc, 0xcd85, 0xd9bd, 0xe6b0, 0xf467,
];

/// Rate increments for envelope segments, delays and portamento, index 0 is the fastest setting
pub static ENV_TABLE: [u16; 256] = [
    0xffff, 0xf5c5, 0xebf3, 0xe286, 0xd979, 0xd0c8, 0xc871, 0xc06f, 0xb8bf, 0xb15d, 0xaa47, 0xa379,
    0x9cf1, 0x96ac, 0x90a7, 0x8ae0, 0x8553, 0x8000, 0x7ae2, 0x75f9, 0x7143, 0x6cbc, 0x6864, 0x6439,
    0x6037, 0x5c5f, 0x58af, 0x5524, 0x51bd, 0x4e79, 0x4b56, 0x4854, 0x4570, 0x42aa, 0x4000, 0x3d71,
    0x3afd, 0x38a1, 0x365e, 0x3432, 0x321c, 0x301c, 0x2e30, 0x2c57, 0x2a92, 0x28de, 0x273c, 0x25ab,
    0x242a, 0x22b8, 0x2155, 0x2000, 0x1eb9, 0x1d7e, 0x1c51, 0x1b2f, 0x1a19, 0x190e, 0x180e, 0x1718,
    0x162c, 0x1549, 0x146f, 0x139e, 0x12d6, 0x1215, 0x115c, 0x10aa, 0x1000, 0x0f5c, 0x0ebf, 0x0e28,
    0x0d98, 0x0d0d, 0x0c87, 0x0c07, 0x0b8c, 0x0b16, 0x0aa4, 0x0a38, 0x09cf, 0x096b, 0x090a, 0x08ae,
    0x0855, 0x0800, 0x07ae, 0x0760, 0x0714, 0x06cc, 0x0686, 0x0644, 0x0603, 0x05c6, 0x058b, 0x0552,
    0x051c, 0x04e8, 0x04b5, 0x0485, 0x0457, 0x042b, 0x0400, 0x03d7, 0x03b0, 0x038a, 0x0366, 0x0343,
    0x0322, 0x0302, 0x02e3, 0x02c5, 0x02a9, 0x028e, 0x0274, 0x025b, 0x0243, 0x022b, 0x0215, 0x0200,
    0x01ec, 0x01d8, 0x01c5, 0x01b3, 0x01a2, 0x0191, 0x0181, 0x0171, 0x0163, 0x0155, 0x0147, 0x013a,
    0x012d, 0x0121, 0x0116, 0x010b, 0x0100, 0x00f6, 0x00ec, 0x00e3, 0x00d9, 0x00d1, 0x00c8, 0x00c0,
    0x00b9, 0x00b1, 0x00aa, 0x00a3, 0x009d, 0x0097, 0x0091, 0x008b, 0x0085, 0x0080, 0x007b, 0x0076,
    0x0071, 0x006d, 0x0068, 0x0064, 0x0060, 0x005c, 0x0059, 0x0055, 0x0052, 0x004e, 0x004b, 0x0048,
    0x0045, 0x0043, 0x0040, 0x003d, 0x003b, 0x0039, 0x0036, 0x0034, 0x0032, 0x0030, 0x002e, 0x002c,
    0x002b, 0x0029, 0x0027, 0x0026, 0x0024, 0x0023, 0x0021, 0x0020, 0x001f, 0x001d, 0x001c, 0x001b,
    0x001a, 0x0019, 0x0018, 0x0017, 0x0016, 0x0015, 0x0014, 0x0014, 0x0013, 0x0012, 0x0011, 0x0011,
    0x0010, 0x000f, 0x000f, 0x000e, 0x000e, 0x000d, 0x000d, 0x000c, 0x000c, 0x000b, 0x000b, 0x000a,
    0x000a, 0x0009, 0x0009, 0x0009, 0x0008, 0x0008, 0x0008, 0x0007, 0x0007, 0x0007, 0x0007, 0x0006,
    0x0006, 0x0006, 0x0006, 0x0005, 0x0005, 0x0005, 0x0005, 0x0005, 0x0004, 0x0004, 0x0004, 0x0004,
    0x0004, 0x0004, 0x0003, 0x0003, 0x0003, 0x0003, 0x0003, 0x0003, 0x0003, 0x0003, 0x0002, 0x0002,
    0x0002, 0x0002, 0x0002, 0x0002,
];

/// LFO phase increments, index 0 is the slowest rate
pub static LFO_TABLE: [u16; 256] = [
    0x0003, 0x0003, 0x0003, 0x0003, 0x0003, 0x0003, 0x0003, 0x0003, 0x0003, 0x0003, 0x0004, 0x0004,
    0x0004, 0x0004, 0x0004, 0x0004, 0x0004, 0x0005, 0x0005, 0x0005, 0x0005, 0x0005, 0x0005, 0x0006,
    0x0006, 0x0006, 0x0006, 0x0006, 0x0007, 0x0007, 0x0007, 0x0007, 0x0007, 0x0008, 0x0008, 0x0008,
    0x0009, 0x0009, 0x0009, 0x0009, 0x000a, 0x000a, 0x000a, 0x000b, 0x000b, 0x000b, 0x000c, 0x000c,
    0x000d, 0x000d, 0x000e, 0x000e, 0x000e, 0x000f, 0x000f, 0x0010, 0x0011, 0x0011, 0x0012, 0x0012,
    0x0013, 0x0013, 0x0014, 0x0015, 0x0016, 0x0016, 0x0017, 0x0018, 0x0019, 0x0019, 0x001a, 0x001b,
    0x001c, 0x001d, 0x001e, 0x001f, 0x0020, 0x0021, 0x0022, 0x0023, 0x0024, 0x0026, 0x0027, 0x0028,
    0x002a, 0x002b, 0x002c, 0x002e, 0x0030, 0x0031, 0x0033, 0x0034, 0x0036, 0x0038, 0x003a, 0x003c,
    0x003e, 0x0040, 0x0042, 0x0044, 0x0047, 0x0049, 0x004b, 0x004e, 0x0051, 0x0053, 0x0056, 0x0059,
    0x005c, 0x005f, 0x0062, 0x0066, 0x0069, 0x006c, 0x0070, 0x0074, 0x0078, 0x007c, 0x0080, 0x0084,
    0x0089, 0x008d, 0x0092, 0x0097, 0x009c, 0x00a1, 0x00a7, 0x00ac, 0x00b2, 0x00b8, 0x00be, 0x00c5,
    0x00cb, 0x00d2, 0x00d9, 0x00e0, 0x00e8, 0x00f0, 0x00f8, 0x0100, 0x0109, 0x0111, 0x011b, 0x0124,
    0x012e, 0x0138, 0x0143, 0x014d, 0x0159, 0x0164, 0x0170, 0x017c, 0x0189, 0x0196, 0x01a4, 0x01b2,
    0x01c1, 0x01d0, 0x01df, 0x01f0, 0x0200, 0x0211, 0x0223, 0x0235, 0x0248, 0x025c, 0x0270, 0x0285,
    0x029b, 0x02b1, 0x02c9, 0x02e0, 0x02f9, 0x0313, 0x032d, 0x0348, 0x0365, 0x0382, 0x03a0, 0x03bf,
    0x03df, 0x0401, 0x0423, 0x0447, 0x046b, 0x0491, 0x04b9, 0x04e1, 0x050b, 0x0536, 0x0563, 0x0591,
    0x05c1, 0x05f3, 0x0626, 0x065b, 0x0691, 0x06ca, 0x0704, 0x0740, 0x077f, 0x07bf, 0x0802, 0x0847,
    0x088e, 0x08d7, 0x0923, 0x0972, 0x09c3, 0x0a17, 0x0a6d, 0x0ac7, 0x0b24, 0x0b83, 0x0be6, 0x0c4d,
    0x0cb6, 0x0d24, 0x0d95, 0x0e09, 0x0e82, 0x0eff, 0x0f7f, 0x1005, 0x108e, 0x111d, 0x11b0, 0x1248,
    0x12e5, 0x1387, 0x142f, 0x14dc, 0x1590, 0x1649, 0x1708, 0x17ce, 0x189b, 0x196e, 0x1a49, 0x1b2b,
    0x1c14, 0x1d06, 0x1dff, 0x1f01, 0x200b, 0x211f, 0x223b, 0x2362, 0x2492, 0x25cc, 0x2711, 0x2861,
    0x29bc, 0x2b22, 0x2c95, 0x2e14,
];

/// MIDI clock locked LFO incrementers for the fastest rate settings
///
/// The LFO advances 16 times per quarter note in clock sync mode, these give periods of
/// 16, 12, 8, 6, 4, 3, 2, 1.5, 1, 1/2 and 1/4 quarter notes.
pub static LFO_TABLE_MCLK: [u16; 11] = [
    0x0100, 0x0155, 0x0200, 0x02ab, 0x0400, 0x0555, 0x0800, 0x0aab, 0x1000, 0x2000, 0x4000,
];

/// A quarter of a sine wave in `[0, 0x7fff]`, mirrored and negated to build the full cycle
pub static SIN_TABLE: [i16; 128] = [
    0x0000, 0x0195, 0x032a, 0x04c0, 0x0654, 0x07e9, 0x097d, 0x0b11, 0x0ca5, 0x0e38, 0x0fca, 0x115c,
    0x12ed, 0x147e, 0x160e, 0x179c, 0x192a, 0x1ab7, 0x1c43, 0x1dce, 0x1f57, 0x20df, 0x2266, 0x23ec,
    0x2570, 0x26f3, 0x2875, 0x29f4, 0x2b72, 0x2cef, 0x2e69, 0x2fe2, 0x3159, 0x32ce, 0x3441, 0x35b2,
    0x3721, 0x388d, 0x39f8, 0x3b60, 0x3cc6, 0x3e29, 0x3f8a, 0x40e9, 0x4245, 0x439e, 0x44f5, 0x4649,
    0x479b, 0x48e9, 0x4a35, 0x4b7d, 0x4cc3, 0x4e06, 0x4f46, 0x5082, 0x51bc, 0x52f2, 0x5425, 0x5555,
    0x5681, 0x57aa, 0x58d0, 0x59f2, 0x5b11, 0x5c2c, 0x5d43, 0x5e57, 0x5f67, 0x6073, 0x617c, 0x6280,
    0x6381, 0x647e, 0x6577, 0x666c, 0x675d, 0x684a, 0x6933, 0x6a18, 0x6af9, 0x6bd5, 0x6cad, 0x6d81,
    0x6e51, 0x6f1c, 0x6fe3, 0x70a6, 0x7164, 0x721e, 0x72d3, 0x7384, 0x7430, 0x74d8, 0x757b, 0x761a,
    0x76b4, 0x7749, 0x77da, 0x7866, 0x78ed, 0x796f, 0x79ed, 0x7a66, 0x7ada, 0x7b49, 0x7bb4, 0x7c1a,
    0x7c7a, 0x7cd6, 0x7d2d, 0x7d7f, 0x7dcd, 0x7e15, 0x7e58, 0x7e97, 0x7ed0, 0x7f05, 0x7f34, 0x7f5f,
    0x7f84, 0x7fa5, 0x7fc0, 0x7fd7, 0x7fe8, 0x7ff5, 0x7ffc, 0x7fff,
];
