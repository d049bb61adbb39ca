use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use time::{OffsetDateTime, UtcOffset};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
}

impl CompressionMethod {
    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
        }
    }
}

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: u32 = 0x04034b50;
pub const LFH_SIZE: usize = 30;

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: u32 = 0x02014b50;
pub const CDFH_MIN_SIZE: usize = 46;

/// "Version needed to extract" for stored and deflated entries (2.0).
pub const VERSION_NEEDED: u16 = 20;

/// "Version made by": MS-DOS host, APPNOTE version 0.
pub const VERSION_MADE_BY: u16 = 0;

/// A packed MS-DOS date and time, 2-second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DosDateTime {
    pub date: u16,
    pub time: u16,
}

impl DosDateTime {
    /// Earliest representable moment, 1980-01-01 00:00:00.
    pub const EPOCH: DosDateTime = DosDateTime {
        date: 1 + (1 << 5),
        time: 0,
    };

    /// Convert a Unix timestamp as seen from the given UTC offset.
    ///
    /// Moments outside 1980..=2107 are clamped to the nearest representable
    /// value.
    pub fn from_timestamp(secs: i64, offset: UtcOffset) -> Self {
        let Ok(utc) = OffsetDateTime::from_unix_timestamp(secs) else {
            return Self::EPOCH;
        };
        let local = utc.to_offset(offset);

        let year = local.year();
        if year < 1980 {
            return Self::EPOCH;
        }
        if year > 2107 {
            return Self {
                date: 31 + (12 << 5) + (127 << 9),
                time: 29 + (59 << 5) + (23 << 11),
            };
        }

        let date = local.day() as u16 + ((local.month() as u16) << 5) + (((year - 1980) as u16) << 9);
        let time = (local.second() / 2) as u16 + ((local.minute() as u16) << 5) + ((local.hour() as u16) << 11);
        Self { date, time }
    }

    /// Convert a Unix timestamp using the local time zone at that moment.
    ///
    /// Falls back to UTC when the local offset cannot be determined.
    pub fn from_timestamp_local(secs: i64) -> Self {
        let offset = OffsetDateTime::from_unix_timestamp(secs)
            .ok()
            .and_then(|t| UtcOffset::local_offset_at(t).ok())
            .unwrap_or(UtcOffset::UTC);
        Self::from_timestamp(secs, offset)
    }

    /// Parse the date into (year, month, day)
    pub fn ymd(&self) -> (u16, u8, u8) {
        let day = (self.date & 0x1F) as u8;
        let month = ((self.date >> 5) & 0x0F) as u8;
        let year = ((self.date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse the time into (hour, minute, second)
    pub fn hms(&self) -> (u8, u8, u8) {
        let second = ((self.time & 0x1F) * 2) as u8;
        let minute = ((self.time >> 5) & 0x3F) as u8;
        let hour = ((self.time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}

/// Fields shared by an entry's local header and its central directory record.
///
/// Both records are always produced from the same value, so they cannot
/// disagree on method, timestamp, CRC or sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub method: CompressionMethod,
    pub modified: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
}

impl FileHeader {
    /// Write the 30-byte local file header (file name not included).
    pub fn write_local<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(LFH_SIGNATURE)?;
        w.write_u16::<LittleEndian>(VERSION_NEEDED)?;
        w.write_u16::<LittleEndian>(0)?; // flags
        self.write_common(w)?;
        w.write_u16::<LittleEndian>(0) // extra field length
    }

    /// Write the 46-byte central directory header (file name not included).
    pub fn write_central<W: Write>(&self, w: &mut W, local_header_offset: u32) -> io::Result<()> {
        w.write_u32::<LittleEndian>(CDFH_SIGNATURE)?;
        w.write_u16::<LittleEndian>(VERSION_MADE_BY)?;
        w.write_u16::<LittleEndian>(VERSION_NEEDED)?;
        w.write_u16::<LittleEndian>(0)?; // flags
        self.write_common(w)?;
        w.write_u16::<LittleEndian>(0)?; // extra field length
        w.write_u16::<LittleEndian>(0)?; // file comment length
        w.write_u16::<LittleEndian>(0)?; // disk number start
        w.write_u16::<LittleEndian>(0)?; // internal attributes
        w.write_u32::<LittleEndian>(0)?; // external attributes
        w.write_u32::<LittleEndian>(local_header_offset)
    }

    fn write_common<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u16::<LittleEndian>(self.method.as_u16())?;
        w.write_u16::<LittleEndian>(self.modified.time)?;
        w.write_u16::<LittleEndian>(self.modified.date)?;
        w.write_u32::<LittleEndian>(self.crc32)?;
        w.write_u32::<LittleEndian>(self.compressed_size)?;
        w.write_u32::<LittleEndian>(self.uncompressed_size)?;
        w.write_u16::<LittleEndian>(self.file_name_length)
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: u32 = 0x06054b50;
    pub const SIZE: usize = 22;

    /// Single-disk trailer for `entries` records occupying `cd_size` bytes
    /// starting at `cd_offset`.
    pub fn single_disk(entries: u16, cd_size: u32, cd_offset: u32, comment_len: u16) -> Self {
        Self {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: entries,
            total_entries: entries,
            cd_size,
            cd_offset,
            comment_len,
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(Self::SIGNATURE)?;
        w.write_u16::<LittleEndian>(self.disk_number)?;
        w.write_u16::<LittleEndian>(self.disk_with_cd)?;
        w.write_u16::<LittleEndian>(self.disk_entries)?;
        w.write_u16::<LittleEndian>(self.total_entries)?;
        w.write_u32::<LittleEndian>(self.cd_size)?;
        w.write_u32::<LittleEndian>(self.cd_offset)?;
        w.write_u16::<LittleEndian>(self.comment_len)
    }
}
