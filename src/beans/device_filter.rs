use std::fmt::{Display, Formatter};

/// Android API level, 例如 `SdkVersion::KITKAT` 为 19
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SdkVersion(pub u32);

impl SdkVersion {
    pub const ECLAIR: SdkVersion = SdkVersion(7);
    pub const FROYO: SdkVersion = SdkVersion(8);
    pub const GINGERBREAD: SdkVersion = SdkVersion(9);
    pub const GINGERBREAD_MR1: SdkVersion = SdkVersion(10);
    pub const HONEYCOMB: SdkVersion = SdkVersion(11);
    pub const HONEYCOMB_MR1: SdkVersion = SdkVersion(12);
    pub const HONEYCOMB_MR2: SdkVersion = SdkVersion(13);
    pub const ICE_CREAM_SANDWICH: SdkVersion = SdkVersion(14);
    pub const ICE_CREAM_SANDWICH_MR1: SdkVersion = SdkVersion(15);
    pub const JELLY_BEAN: SdkVersion = SdkVersion(16);
    pub const JELLY_BEAN_MR1: SdkVersion = SdkVersion(17);
    pub const JELLY_BEAN_MR2: SdkVersion = SdkVersion(18);
    pub const KITKAT: SdkVersion = SdkVersion(19);
    pub const WEAR: SdkVersion = SdkVersion(20);
    pub const LOLLIPOP: SdkVersion = SdkVersion(21);
    pub const LOLLIPOP_MR1: SdkVersion = SdkVersion(22);
    pub const M: SdkVersion = SdkVersion(23);
    pub const N: SdkVersion = SdkVersion(24);
    pub const N_MR1: SdkVersion = SdkVersion(25);
    pub const O: SdkVersion = SdkVersion(26);
    pub const O_MR1: SdkVersion = SdkVersion(27);
    pub const P: SdkVersion = SdkVersion(28);
    pub const Q: SdkVersion = SdkVersion(29);
    pub const R: SdkVersion = SdkVersion(30);
    pub const S: SdkVersion = SdkVersion(31);
    pub const S_V2: SdkVersion = SdkVersion(32);
    pub const TIRAMISU: SdkVersion = SdkVersion(33);
    pub const UPSIDE_DOWN_CAKE: SdkVersion = SdkVersion(34);
    pub const VANILLA_ICE_CREAM: SdkVersion = SdkVersion(35);
    pub const LATEST: SdkVersion = SdkVersion::VANILLA_ICE_CREAM;

    /// 版本代号, 未知的 API level 返回空字符串
    pub fn name(&self) -> &'static str {
        match self.0 {
            7 => "ECLAIR",
            8 => "FROYO",
            9 => "GINGERBREAD",
            10 => "GINGERBREAD_MR1",
            11 => "HONEYCOMB",
            12 => "HONEYCOMB_MR1",
            13 => "HONEYCOMB_MR2",
            14 => "ICE_CREAM_SANDWICH",
            15 => "ICE_CREAM_SANDWICH_MR1",
            16 => "JELLY_BEAN",
            17 => "JELLY_BEAN_MR1",
            18 => "JELLY_BEAN_MR2",
            19 => "KITKAT",
            20 => "WEAR v1",
            21 => "LOLLIPOP",
            22 => "LOLLIPOP_MR1",
            23 => "M",
            24 => "N",
            25 => "N_MR1",
            26 => "O",
            27 => "O_MR1",
            28 => "P",
            29 => "Q",
            30 => "R",
            31 => "S",
            32 => "S_V2",
            33 => "TIRAMISU",
            34 => "UPSIDE_DOWN_CAKE",
            35 => "VANILLA_ICE_CREAM",
            _ => "",
        }
    }
}

impl Display for SdkVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 屏幕密度 (dpi), 取自 `ro.sf.lcd_density`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DensityBucket(pub u32);

impl DensityBucket {
    pub const LDPI: DensityBucket = DensityBucket(120);
    pub const MDPI: DensityBucket = DensityBucket(160);
    pub const HDPI: DensityBucket = DensityBucket(240);
    pub const XHDPI: DensityBucket = DensityBucket(320);
    pub const XXHDPI: DensityBucket = DensityBucket(480);
    pub const XXXHDPI: DensityBucket = DensityBucket(640);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceType {
    #[default]
    Phone,
    Tablet7,
    Tablet10,
}

impl DeviceType {
    /// 根据最短边的 dp 值分类: >= 720 为 10 寸平板, >= 600 为 7 寸平板
    pub fn classify(width: u32, height: u32, density: DensityBucket) -> DeviceType {
        if density.0 == 0 {
            return DeviceType::Phone;
        }
        let shortest = u64::from(width.min(height));
        let dp = shortest * u64::from(DensityBucket::MDPI.0) / u64::from(density.0);
        if dp >= 720 {
            DeviceType::Tablet10
        } else if dp >= 600 {
            DeviceType::Tablet7
        } else {
            DeviceType::Phone
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Phone => "Phone",
            DeviceType::Tablet7 => "7in Tablet",
            DeviceType::Tablet10 => "10in Tablet",
        }
    }
}

impl Display for DeviceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 参与过滤的设备属性
pub trait FilterTarget {
    fn serial(&self) -> &str;
    fn sdk(&self) -> SdkVersion;
    fn density(&self) -> DensityBucket;
}

/// 设备过滤条件, 纯谓词, 可重复使用。
///
/// - `serials` 为空表示不限制序列号
/// - `min_sdk` / `max_sdk` 为 `SdkVersion(0)` 表示该侧不限
/// - `density` 为 `DensityBucket(0)` 表示不限
/// - `device_type` 只是提示信息, 不参与 `matches`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    pub serials: Vec<String>,
    pub min_sdk: SdkVersion,
    pub max_sdk: SdkVersion,
    pub density: DensityBucket,
    pub device_type: Option<DeviceType>,
}

impl DeviceFilter {
    /// 匹配所有设备
    pub fn all() -> Self {
        DeviceFilter::default()
    }

    pub fn with_serials<I, S>(mut self, serials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.serials = serials.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sdk_range(mut self, min_sdk: SdkVersion, max_sdk: SdkVersion) -> Self {
        self.min_sdk = min_sdk;
        self.max_sdk = max_sdk;
        self
    }

    pub fn with_density(mut self, density: DensityBucket) -> Self {
        self.density = density;
        self
    }

    pub fn with_device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = Some(device_type);
        self
    }

    pub fn matches<D: FilterTarget + ?Sized>(&self, device: &D) -> bool {
        let sdk = device.sdk();
        if sdk < self.min_sdk {
            return false;
        }
        if self.max_sdk.0 != 0 && sdk > self.max_sdk {
            return false;
        }
        if !self.serials.is_empty() && !self.serials.iter().any(|s| s == device.serial()) {
            return false;
        }
        self.density.0 == 0 || self.density == device.density()
    }
}
