//! Curated agriculture passages shipped with the binary.

/// `(topic, source, url, text)` in corpus order.
pub(crate) const BUILTIN_PASSAGES: &[(&str, &str, &str, &str)] = &[
    (
        "sowing",
        "FAO Crop Calendar Guidelines",
        "https://www.fao.org/land-water/databases-and-software/crop-information/en/",
        "Sowing is the first stage of crop lifecycle where seeds are planted into prepared soil. Seeds should be sown at the correct depth — typically 2-4 times the seed diameter. Good soil-seed contact is essential for germination. Sowing can be done by broadcasting, drilling, or dibbling methods.",
    ),
    (
        "germination",
        "USDA Agricultural Research Service",
        "https://www.ars.usda.gov/",
        "Germination is the process by which a seed sprouts into a seedling. It requires adequate moisture, suitable temperature, and oxygen. The embryo inside the seed uses stored nutrients until the seedling develops its first true leaves and can photosynthesize on its own.",
    ),
    (
        "vegetative growth",
        "ICAR Crop Science Handbook",
        "https://icar.org.in/",
        "Vegetative growth stage is when the plant develops its leaves, stems, and roots. During this stage, the plant focuses on building its structure. Adequate sunlight and water are critical. Farmers should ensure proper spacing to allow each plant enough resources.",
    ),
    (
        "flowering",
        "FAO Plant Production and Protection",
        "https://www.fao.org/agriculture/crops/",
        "Flowering or reproductive stage is when the plant produces flowers which will later become fruits or grains. This is a critical stage that is sensitive to temperature extremes and water stress. Pollination (by wind, insects, or hand) must occur for fruit set.",
    ),
    (
        "grain filling",
        "CIMMYT Wheat and Maize Guidelines",
        "https://www.cimmyt.org/",
        "Grain filling or fruit development stage follows successful pollination. The plant redirects energy to developing seeds or fruits. Adequate water supply during this period is important. Any stress at this stage can lead to poor grain quality or low fruit size.",
    ),
    (
        "maturation",
        "FAO Postharvest Loss Assessment",
        "https://www.fao.org/postharvest-loss-reduction/",
        "Maturation or ripening is the final crop growth stage. Grain moisture content drops and plant tissue yellows. Visual cues like color change, hardness of seed, and dry foliage indicate readiness for harvest. Timing the harvest correctly prevents losses due to shattering or spoilage.",
    ),
    (
        "harvesting",
        "FAO Agricultural Services Bulletin",
        "https://www.fao.org/3/y2008e/y2008e00.htm",
        "Harvesting involves cutting, picking, or uprooting the mature crop. Methods include manual harvesting with hand tools and mechanical harvesting with combine harvesters. Crops should be harvested at the right moisture content — grains typically at 14-20% moisture before drying.",
    ),
    (
        "threshing",
        "ICAR Postharvest Technology Centre",
        "https://icar.org.in/node/31",
        "Threshing and winnowing are post-harvest processes that separate grain from the plant. Threshing detaches grain from the stalk through beating or mechanical action. Winnowing removes lighter chaff from heavier grain using wind or fans. These steps are crucial for clean grain.",
    ),
    (
        "drying",
        "FAO Grain Storage Guidelines",
        "https://www.fao.org/postharvest-loss-reduction/resources/detail/en/c/431008/",
        "Drying is a critical post-harvest step to reduce grain moisture content to safe storage levels (typically below 13% for most grains). Sun drying on clean surfaces or mechanical dryers are common methods. Inadequate drying leads to mold growth and grain spoilage.",
    ),
    (
        "storage",
        "FAO Good Storage Practices",
        "https://www.fao.org/3/i3131e/i3131e.pdf",
        "Grain storage preserves harvested crops for later use or sale. Storage structures include jute bags in warehouses, metal silos, and underground pits. Key factors for good storage are low temperature, low humidity, darkness, and exclusion of pests and rodents.",
    ),
    (
        "irrigation",
        "FAO Irrigation and Drainage Paper",
        "https://www.fao.org/land-water/water/water-management/irrigationwater/en/",
        "Irrigation is the controlled application of water to crops. The main methods are flood/furrow irrigation, sprinkler irrigation, and drip irrigation. The choice of method depends on the crop type, soil texture, water availability, and terrain. Proper irrigation scheduling prevents both water stress and waterlogging.",
    ),
    (
        "drip irrigation",
        "FAO Water Reports — Micro-irrigation",
        "https://www.fao.org/3/y3765e/y3765e00.htm",
        "Drip irrigation delivers water directly to the plant root zone through a network of pipes and emitters. It is highly water-efficient, reducing water use by up to 50% compared to flood irrigation. It is especially suitable for row crops, orchards, and water-scarce regions.",
    ),
    (
        "land preparation",
        "ICAR Agronomy Practices Manual",
        "https://icar.org.in/",
        "Land preparation involves tillage operations such as plowing, harrowing, and leveling to create a suitable seedbed. Proper tillage breaks up compacted soil, incorporates crop residues, and improves aeration and water infiltration before sowing.",
    ),
    (
        "crop rotation",
        "FAO Conservation Agriculture",
        "https://www.fao.org/conservation-agriculture/en/",
        "Crop rotation is the practice of growing different crops in the same field in sequential seasons. It helps maintain soil health, break disease and pest cycles, and improve nutrient balance. Common examples include rotating cereal crops with legumes such as wheat followed by chickpea.",
    ),
    (
        "intercropping",
        "CGIAR Intercropping Research",
        "https://www.cgiar.org/",
        "Intercropping is growing two or more crops simultaneously on the same land. It improves land use efficiency, reduces risk of total crop failure, and can improve biodiversity. Examples include growing maize and beans together, where beans fix nitrogen that benefits maize.",
    ),
    (
        "transplanting",
        "IRRI Rice Knowledge Bank",
        "https://www.knowledgebank.irri.org/",
        "Transplanting is the process of moving seedlings grown in a nursery to the main field. It is common in rice, tomato, and tobacco cultivation. Transplanting allows better management of early crop growth and ensures uniform plant density in the main field.",
    ),
];

/// Four generic passages used only when fallback is explicitly allowed.
pub(crate) const FALLBACK_PASSAGES: &[&str] = &[
    "Crop lifecycle includes soil preparation, sowing, irrigation, fertilization, and harvesting.",
    "Proper irrigation is essential for maintaining soil moisture.",
    "Weed management helps improve crop productivity.",
    "Harvesting should be done at the right maturity stage.",
];
