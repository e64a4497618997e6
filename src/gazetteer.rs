//! Static place-name knowledge base for map charts.
//!
//! One lookup structure covers provinces, cities and the map areas they
//! render into. Built once on first use and shared read-only afterwards.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Map id of the nation-level map.
pub const NATION_MAP_ID: &str = "china";
const NATION_ADCODE: u32 = 100000;

const DATAV_BOUND_URL: &str = "https://geo.datav.aliyun.com/areas_v3/bound";
const ECHARTS_MAP_URL: &str = "https://cdn.jsdelivr.net/npm/echarts@4.9.0/map/json";

/// Map detail level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Nation,
    Province,
    City,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Nation => "nation",
            Granularity::Province => "province",
            Granularity::City => "city",
        }
    }
}

/// A renderable map: its id, administrative code and default viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapArea {
    pub map_id: &'static str,
    pub granularity: Granularity,
    pub adcode: u32,
    pub center: (f64, f64),
    pub zoom: f64,
}

/// A known city: the province it belongs to and, when it has one, its own map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CityEntry {
    pub province: &'static str,
    pub map_id: Option<&'static str>,
}

// (display name, map id, adcode, center, zoom)
type ProvinceRow = (&'static str, &'static str, u32, (f64, f64), f64);

const PROVINCES: &[ProvinceRow] = &[
    ("山东", "shandong", 370000, (117.000923, 36.675807), 1.8),
    ("北京", "beijing", 110000, (116.383331, 39.916668), 2.5),
    ("上海", "shanghai", 310000, (121.472644, 31.231706), 2.5),
    ("广东", "guangdong", 440000, (113.280637, 23.125178), 1.8),
    ("四川", "sichuan", 510000, (104.065735, 30.659462), 1.5),
    ("江苏", "jiangsu", 320000, (118.767413, 32.041544), 1.8),
    ("浙江", "zhejiang", 330000, (120.153576, 30.287459), 1.8),
    ("河北", "hebei", 130000, (114.502461, 38.045474), 1.6),
    ("河南", "henan", 410000, (113.665412, 34.757975), 1.6),
    ("湖北", "hubei", 420000, (114.298572, 30.584355), 1.8),
    ("湖南", "hunan", 430000, (112.982279, 28.19409), 1.8),
    ("安徽", "anhui", 340000, (117.283042, 31.86119), 1.8),
    ("福建", "fujian", 350000, (119.306239, 26.075302), 2.0),
    ("江西", "jiangxi", 360000, (115.892151, 28.676493), 1.8),
    ("辽宁", "liaoning", 210000, (123.429096, 41.796767), 1.8),
    ("吉林", "jilin", 220000, (125.3245, 43.886841), 1.8),
    ("黑龙江", "heilongjiang", 230000, (126.642464, 45.756967), 1.5),
    ("内蒙古", "neimenggu", 150000, (111.670801, 40.818311), 1.2),
    ("山西", "shanxi", 140000, (112.549248, 37.857014), 1.8),
    ("陕西", "shaanxi", 610000, (108.948024, 34.263161), 1.6),
    ("甘肃", "gansu", 620000, (103.823557, 36.058039), 1.3),
    ("青海", "qinghai", 630000, (101.778916, 36.623178), 1.3),
    ("宁夏", "ningxia", 640000, (106.278179, 38.46637), 2.2),
    ("新疆", "xinjiang", 650000, (87.617733, 43.792818), 1.0),
    ("西藏", "xizang", 540000, (91.132212, 29.660361), 1.0),
    ("云南", "yunnan", 530000, (102.712251, 25.040609), 1.5),
    ("贵州", "guizhou", 520000, (106.713478, 26.578343), 1.8),
    ("重庆", "chongqing", 500000, (106.504962, 29.533155), 2.2),
    ("天津", "tianjin", 120000, (117.190182, 39.125596), 2.5),
    ("广西", "guangxi", 450000, (108.320004, 22.82402), 1.6),
    ("海南", "hainan", 460000, (110.33119, 20.031971), 2.2),
];

// Cities with their own boundary map: (name, map id, adcode, center)
type MappedCityRow = (&'static str, &'static str, u32, (f64, f64));

const SHANDONG_CITIES: &[MappedCityRow] = &[
    ("济南", "jinan", 370100, (117.000923, 36.675807)),
    ("青岛", "qingdao", 370200, (120.355173, 36.082982)),
    ("淄博", "zibo", 370300, (118.047648, 36.814939)),
    ("枣庄", "zaozhuang", 370400, (117.557964, 34.856424)),
    ("东营", "dongying", 370500, (118.49642, 37.461266)),
    ("烟台", "yantai", 370600, (121.391382, 37.539297)),
    ("潍坊", "weifang", 370700, (119.107078, 36.70925)),
    ("济宁", "jining", 370800, (116.587245, 35.415393)),
    ("泰安", "taian", 370900, (117.129063, 36.194968)),
    ("威海", "weihai", 371000, (122.116394, 37.513068)),
    ("日照", "rizhao", 371100, (119.461208, 35.428588)),
    ("临沂", "linyi", 371300, (118.326443, 35.065282)),
    ("德州", "dezhou", 371400, (116.307428, 37.453968)),
    ("聊城", "liaocheng", 371500, (115.980367, 36.456013)),
    ("滨州", "binzhou", 371600, (118.016974, 37.383542)),
    ("菏泽", "heze", 371700, (115.469381, 35.246531)),
];

const CITY_ZOOM: f64 = 2.5;

// Cities known only by the province they belong to: (province map id, names)
const PROVINCE_CITIES: &[(&str, &[&str])] = &[
    ("guangdong", &[
        "广州", "深圳", "珠海", "佛山", "韶关", "湛江", "肇庆", "江门", "茂名", "惠州", "梅州",
        "汕尾", "河源", "阳江", "清远", "东莞", "中山", "潮州", "揭阳", "云浮", "汕头",
    ]),
    ("jiangsu", &[
        "南京", "苏州", "无锡", "常州", "镇江", "南通", "泰州", "扬州", "盐城", "连云港", "徐州",
        "淮安", "宿迁",
    ]),
    ("zhejiang", &[
        "杭州", "宁波", "温州", "嘉兴", "湖州", "绍兴", "金华", "衢州", "舟山", "台州", "丽水",
    ]),
    ("hebei", &[
        "石家庄", "唐山", "秦皇岛", "邯郸", "邢台", "保定", "张家口", "承德", "沧州", "廊坊", "衡水",
    ]),
    ("henan", &[
        "郑州", "开封", "洛阳", "平顶山", "安阳", "鹤壁", "新乡", "焦作", "濮阳", "许昌", "漯河",
        "三门峡", "南阳", "商丘", "信阳", "周口", "驻马店",
    ]),
    ("sichuan", &[
        "成都", "自贡", "攀枝花", "泸州", "德阳", "绵阳", "广元", "遂宁", "内江", "乐山", "南充",
        "眉山", "宜宾", "广安", "达州", "雅安", "巴中", "资阳",
    ]),
    ("hubei", &[
        "武汉", "黄石", "十堰", "宜昌", "襄阳", "鄂州", "荆门", "孝感", "荆州", "黄冈", "咸宁", "随州",
    ]),
    ("hunan", &[
        "长沙", "株洲", "湘潭", "衡阳", "邵阳", "岳阳", "常德", "张家界", "益阳", "郴州", "永州",
        "怀化", "娄底",
    ]),
    ("anhui", &[
        "合肥", "芜湖", "蚌埠", "淮南", "马鞍山", "淮北", "铜陵", "安庆", "黄山", "滁州", "阜阳",
        "宿州", "六安", "亳州", "池州", "宣城",
    ]),
    ("fujian", &["福州", "厦门", "莆田", "三明", "泉州", "漳州", "南平", "龙岩", "宁德"]),
    ("jiangxi", &[
        "南昌", "景德镇", "萍乡", "九江", "新余", "鹰潭", "赣州", "吉安", "宜春", "抚州", "上饶",
    ]),
    ("liaoning", &[
        "沈阳", "大连", "鞍山", "抚顺", "本溪", "丹东", "锦州", "营口", "阜新", "辽阳", "盘锦",
        "铁岭", "朝阳", "葫芦岛",
    ]),
    ("jilin", &["长春", "吉林", "四平", "辽源", "通化", "白山", "松原", "白城"]),
    ("heilongjiang", &[
        "哈尔滨", "齐齐哈尔", "鸡西", "鹤岗", "双鸭山", "大庆", "伊春", "佳木斯", "七台河",
        "牡丹江", "黑河", "绥化",
    ]),
    ("shanxi", &[
        "太原", "大同", "阳泉", "长治", "晋城", "朔州", "晋中", "运城", "忻州", "临汾", "吕梁",
    ]),
    ("shaanxi", &[
        "西安", "铜川", "宝鸡", "咸阳", "渭南", "延安", "汉中", "榆林", "安康", "商洛",
    ]),
    ("gansu", &[
        "兰州", "嘉峪关", "金昌", "白银", "天水", "武威", "张掖", "平凉", "酒泉", "庆阳", "定西", "陇南",
    ]),
    ("qinghai", &["西宁", "海东"]),
    ("ningxia", &["银川", "石嘴山", "吴忠", "固原", "中卫"]),
    ("xinjiang", &["乌鲁木齐", "克拉玛依", "吐鲁番", "哈密"]),
    ("xizang", &["拉萨", "日喀则", "昌都", "林芝", "山南", "那曲"]),
    ("yunnan", &["昆明", "曲靖", "玉溪", "保山", "昭通", "丽江", "普洱", "临沧"]),
    ("guizhou", &["贵阳", "六盘水", "遵义", "安顺", "毕节", "铜仁"]),
    ("guangxi", &[
        "南宁", "柳州", "桂林", "梧州", "北海", "防城港", "钦州", "贵港", "玉林", "百色", "贺州",
        "河池", "来宾", "崇左",
    ]),
    ("hainan", &["海口", "三亚", "三沙", "儋州"]),
    ("neimenggu", &[
        "呼和浩特", "包头", "乌海", "赤峰", "通辽", "鄂尔多斯", "呼伦贝尔", "巴彦淖尔", "乌兰察布",
    ]),
];

/// Shared, lazily built gazetteer.
pub static GAZETTEER: Lazy<Gazetteer> = Lazy::new(Gazetteer::china);

#[derive(Debug, Clone)]
pub struct Gazetteer {
    provinces: HashMap<&'static str, &'static str>,
    cities: HashMap<&'static str, CityEntry>,
    areas: HashMap<&'static str, MapArea>,
}

impl Gazetteer {
    /// Build the lookup tables for China.
    pub fn china() -> Self {
        let mut provinces = HashMap::new();
        let mut cities = HashMap::new();
        let mut areas = HashMap::new();

        areas.insert(
            NATION_MAP_ID,
            MapArea {
                map_id: NATION_MAP_ID,
                granularity: Granularity::Nation,
                adcode: NATION_ADCODE,
                center: (104.114129, 37.550339),
                zoom: 1.2,
            },
        );

        for &(name, map_id, adcode, center, zoom) in PROVINCES {
            provinces.insert(name, map_id);
            areas.insert(
                map_id,
                MapArea {
                    map_id,
                    granularity: Granularity::Province,
                    adcode,
                    center,
                    zoom,
                },
            );
        }

        for &(name, map_id, adcode, center) in SHANDONG_CITIES {
            cities.insert(
                name,
                CityEntry {
                    province: "shandong",
                    map_id: Some(map_id),
                },
            );
            areas.insert(
                map_id,
                MapArea {
                    map_id,
                    granularity: Granularity::City,
                    adcode,
                    center,
                    zoom: CITY_ZOOM,
                },
            );
        }

        for &(province, names) in PROVINCE_CITIES {
            for &name in names {
                cities.insert(name, CityEntry { province, map_id: None });
            }
        }

        Self {
            provinces,
            cities,
            areas,
        }
    }

    /// Map id of a province or municipality name.
    pub fn province(&self, name: &str) -> Option<&'static str> {
        self.provinces.get(name).copied()
    }

    pub fn city(&self, name: &str) -> Option<CityEntry> {
        self.cities.get(name).copied()
    }

    pub fn area(&self, map_id: &str) -> Option<&MapArea> {
        self.areas.get(map_id)
    }

    /// The nation-level map area.
    pub fn nation(&self) -> &MapArea {
        // Inserted unconditionally in `china()`.
        &self.areas[NATION_MAP_ID]
    }

    /// Area for `map_id`, or the nation when unknown.
    pub fn area_or_nation(&self, map_id: &str) -> &MapArea {
        self.area(map_id).unwrap_or_else(|| self.nation())
    }

    /// Ordered boundary-data sources for a map id. Unknown ids use the
    /// nation's sources.
    pub fn boundary_sources(&self, map_id: &str) -> Vec<String> {
        let area = self.area_or_nation(map_id);
        let mut urls = vec![
            format!("{}/{}_full.json", DATAV_BOUND_URL, area.adcode),
            format!("{}/{}.json", DATAV_BOUND_URL, area.adcode),
        ];
        match area.granularity {
            Granularity::Nation => urls.push(format!("{}/china.json", ECHARTS_MAP_URL)),
            Granularity::Province => urls.push(format!("{}/province/{}.json", ECHARTS_MAP_URL, area.map_id)),
            Granularity::City => {}
        }
        urls
    }
}
